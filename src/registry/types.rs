//! Record types stored in and returned by the registry.

use std::{fmt, sync::Arc, time::Duration};

use jiff::Timestamp;
use serde::Serialize;
use smart_default::SmartDefault;

use crate::{scope::Scope, timer::TimerHandle};

/// Auto-expiry policy for a blocker.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum Timeout {
	#[default]
	Never,
	After(Duration),
}

impl Timeout {
	/// Non-positive values mean "no timeout".
	pub fn from_millis(ms: i64) -> Self {
		if ms <= 0 { Self::Never } else { Self::After(Duration::from_millis(ms as u64)) }
	}

	pub fn duration(&self) -> Option<Duration> {
		match self {
			Self::Never => None,
			Self::After(duration) => Some(*duration),
		}
	}
}

/// Callback invoked with the blocker id, exactly once, immediately before the
/// blocker is removed due to timeout expiry.
#[derive(Clone)]
pub struct OnTimeout(Arc<dyn Fn(&str) + Send + Sync>);

impl OnTimeout {
	pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
		Self(Arc::new(callback))
	}

	pub(crate) fn call(&self, id: &str) {
		(self.0)(id)
	}
}

impl fmt::Debug for OnTimeout {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("OnTimeout(..)")
	}
}

/// Priorities are supplied as signed integers and clamped to zero on every
/// write, so the stored value is non-negative by construction.
pub(crate) fn clamp_priority(priority: i64) -> u32 {
	priority.clamp(0, i64::from(u32::MAX)) as u32
}

/// Full configuration accepted by [`Registry::add`](crate::Registry::add).
#[derive(Clone, Debug, SmartDefault)]
pub struct BlockerConfig {
	#[default(Scope::global())]
	pub scope: Scope,
	#[default("Unknown".into())]
	pub reason: String,
	/// Negative values are clamped to zero on write.
	pub priority: i64,
	pub timeout: Timeout,
	pub on_timeout: Option<OnTimeout>,
	/// Stamped with the current time when `None`.
	pub timestamp: Option<Timestamp>,
}

/// Field-wise patch for [`Registry::update`](crate::Registry::update).
/// `None` leaves the stored field untouched.
#[derive(Clone, Debug, Default)]
pub struct BlockerPatch {
	pub scope: Option<Scope>,
	pub reason: Option<String>,
	pub priority: Option<i64>,
	pub timeout: Option<Timeout>,
	pub on_timeout: Option<OnTimeout>,
	pub timestamp: Option<Timestamp>,
}

impl From<BlockerPatch> for BlockerConfig {
	/// Fill defaults for the upsert path (`update` on an absent id).
	fn from(patch: BlockerPatch) -> Self {
		let base = Self::default();
		Self {
			scope: patch.scope.unwrap_or(base.scope),
			reason: patch.reason.unwrap_or(base.reason),
			priority: patch.priority.unwrap_or(base.priority),
			timeout: patch.timeout.unwrap_or(base.timeout),
			on_timeout: patch.on_timeout,
			timestamp: patch.timestamp,
		}
	}
}

/// One stored blocking demand, as exposed to callers and middleware.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Blocker {
	pub scope: Scope,
	pub reason: String,
	pub priority: u32,
	pub timestamp: Timestamp,
	pub timeout: Timeout,
}

/// A blocker matching a query, annotated with its id.
#[derive(Clone, Debug, PartialEq, Serialize, derive_new::new)]
pub struct BlockerInfo {
	pub id: String,
	#[serde(flatten)]
	pub state: Blocker,
}

/// Internal map entry: the public snapshot plus the resources it owns.
pub(crate) struct Entry {
	pub state: Blocker,
	pub on_timeout: Option<OnTimeout>,
	/// At most one live timer per blocker; dropping the entry cancels it.
	pub timer: Option<TimerHandle>,
	/// Distinguishes the current timer from stale firings of replaced ones.
	pub epoch: u64,
}
