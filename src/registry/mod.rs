//! The blocker registry engine.
//!
//! A registry instance owns one id → blocker map and one middleware pipeline.
//! Mutations are synchronous with respect to the map; middleware observe them
//! through an event queue drained by a per-instance pump task, so
//! instrumentation can never delay or block the mutation path.
//!
//! # Module Structure
//!
//! - `types`: record types (Blocker, BlockerConfig, BlockerPatch, Timeout, ..)
//! - `operations`: the mutation/query operations and timeout firing

mod operations;
mod types;

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, atomic::AtomicU64},
};

use tokio::{runtime::Handle, sync::mpsc};
pub use types::{Blocker, BlockerConfig, BlockerInfo, BlockerPatch, OnTimeout, Timeout};
pub(crate) use types::{Entry, clamp_priority};

use crate::middleware::{self, Envelope, Middleware, Pipeline};

/// A registry instance: one blocker map plus one middleware pipeline.
///
/// Cloning yields another handle to the same instance. Fully independent
/// instances come from [`Registry::new`]; operations on one never affect
/// another.
#[derive(Clone)]
pub struct Registry {
	inner: Arc<Inner>,
}

pub(crate) struct Inner {
	blockers: Mutex<HashMap<String, Entry>>,
	pipeline: Mutex<Pipeline>,
	events_tx: mpsc::UnboundedSender<Envelope>,
	/// Runtime the pump task and expiry timers are spawned on.
	runtime: Handle,
	/// Source of per-timer epochs, so stale firings can be told apart.
	timer_epoch: AtomicU64,
	/// Bumped on every state-changing mutation; lets a binding layer poll for
	/// "the map changed" without subscribing to middleware.
	revision: AtomicU64,
}

impl Registry {
	/// Construct an isolated instance.
	///
	/// # Panics
	/// Panics when called outside a tokio runtime: the event pump and expiry
	/// timers need one, and constructing a registry without it is a wiring
	/// mistake rather than a runtime data condition.
	pub fn new() -> Self {
		Self::with_middleware(std::iter::empty())
	}

	/// Construct an isolated instance seeded with a starting set of
	/// middleware, in iteration order.
	pub fn with_middleware<I>(seed: I) -> Self
	where
		I: IntoIterator<Item = (String, Arc<dyn Middleware>)>,
	{
		let runtime = Handle::try_current().expect("constructing a Registry requires a running tokio runtime");
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		runtime.spawn(middleware::pump(events_rx));

		let mut pipeline = Pipeline::default();
		for (name, mw) in seed {
			pipeline.register(name, mw);
		}

		Self {
			inner: Arc::new(Inner {
				blockers: Mutex::new(HashMap::new()),
				pipeline: Mutex::new(pipeline),
				events_tx,
				runtime,
				timer_epoch: AtomicU64::new(0),
				revision: AtomicU64::new(0),
			}),
		}
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}
