//! Event records handed to middleware after every completed mutation.

use derive_more::Display;
use jiff::Timestamp;
use serde::Serialize;

use crate::registry::Blocker;

/// The mutation a [`BlockerEvent`] describes.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	#[display("add")]
	Add,
	#[display("update")]
	Update,
	#[display("remove")]
	Remove,
	#[display("timeout")]
	Timeout,
	#[display("clear")]
	Clear,
	#[display("clear_scope")]
	ClearScope,
}

/// Immutable record of one completed mutation.
///
/// Which optional fields are populated depends on the action:
/// - `add`/`timeout`: `blocker_id` + `state`
/// - `update`: `blocker_id` + `state` + `prev_state`
/// - `remove`: `blocker_id` + `prev_state`
/// - `clear`: `count`
/// - `clear_scope`: `scope` + `count`
#[derive(Clone, Debug, Serialize)]
pub struct BlockerEvent {
	pub action: Action,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub blocker_id: Option<String>,
	/// Snapshot after the mutation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<Blocker>,
	/// Snapshot before the mutation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prev_state: Option<Blocker>,
	/// The cleared scope, for `clear_scope`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Number of blockers removed, for `clear` and `clear_scope`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub count: Option<usize>,
	pub timestamp: Timestamp,
}

impl BlockerEvent {
	pub(crate) fn new(action: Action, timestamp: Timestamp) -> Self {
		Self {
			action,
			blocker_id: None,
			state: None,
			prev_state: None,
			scope: None,
			count: None,
			timestamp,
		}
	}
}
