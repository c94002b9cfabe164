//! Mutation and query operations, and internal timeout firing.

use std::sync::{Arc, atomic::Ordering};

#[cfg(not(test))]
use jiff::Timestamp as Clock;

#[cfg(test)]
use crate::mocks::MockClock as Clock;
use crate::{
	event::{Action, BlockerEvent},
	middleware::{Envelope, Middleware},
	registry::{Blocker, BlockerConfig, BlockerInfo, BlockerPatch, Entry, Inner, Registry, Timeout, clamp_priority},
	scope::Scope,
	timer::{self, TimerHandle},
};

impl Registry {
	/// Insert or fully replace the blocker under `id`.
	///
	/// Replacement cancels the previous record's timer; re-adding an id is
	/// defined behavior ("refresh" semantics), not an error.
	pub fn add(&self, id: impl Into<String>, config: BlockerConfig) {
		let id = id.into();
		let now = Clock::now();
		let state = Blocker {
			scope: config.scope,
			reason: config.reason,
			priority: clamp_priority(config.priority),
			timestamp: config.timestamp.unwrap_or(now),
			timeout: config.timeout,
		};

		{
			let mut blockers = self.inner.blockers.lock().unwrap();
			let (timer, epoch) = start_timer(&self.inner, &id, state.timeout);
			// Replacing drops the previous entry, which cancels its timer.
			blockers.insert(id.clone(), Entry {
				state: state.clone(),
				on_timeout: config.on_timeout,
				timer,
				epoch,
			});
		}

		let mut event = BlockerEvent::new(Action::Add, now);
		event.blocker_id = Some(id);
		event.state = Some(state);
		emit(&self.inner, event);
	}

	/// Merge `patch` over the existing record, or behave exactly as
	/// [`add`](Self::add) when `id` is absent.
	///
	/// Timer handling: a supplied `timeout` that differs from the stored one
	/// restarts the countdown from now (`Timeout::Never` cancels without
	/// removing the record); an omitted or unchanged `timeout` leaves any
	/// in-flight timer untouched.
	pub fn update(&self, id: impl Into<String>, patch: BlockerPatch) {
		let id = id.into();
		let now = Clock::now();

		let event = {
			let mut blockers = self.inner.blockers.lock().unwrap();
			let Some(entry) = blockers.get_mut(&id) else {
				drop(blockers);
				self.add(id, BlockerConfig::from(patch));
				return;
			};

			let prev = entry.state.clone();
			if let Some(scope) = patch.scope {
				entry.state.scope = scope;
			}
			if let Some(reason) = patch.reason {
				entry.state.reason = reason;
			}
			if let Some(priority) = patch.priority {
				entry.state.priority = clamp_priority(priority);
			}
			if let Some(timestamp) = patch.timestamp {
				entry.state.timestamp = timestamp;
			}
			if let Some(on_timeout) = patch.on_timeout {
				entry.on_timeout = Some(on_timeout);
			}
			if let Some(timeout) = patch.timeout {
				if timeout != entry.state.timeout {
					// Elapsed time is not credited: the countdown restarts.
					let (timer, epoch) = start_timer(&self.inner, &id, timeout);
					entry.timer = timer;
					entry.epoch = epoch;
					entry.state.timeout = timeout;
				}
			}

			let mut event = BlockerEvent::new(Action::Update, now);
			event.blocker_id = Some(id.clone());
			event.state = Some(entry.state.clone());
			event.prev_state = Some(prev);
			event
		};

		emit(&self.inner, event);
	}

	/// Remove the blocker under `id`, cancelling its timer.
	///
	/// Removing an absent id is a no-op and dispatches nothing.
	pub fn remove(&self, id: &str) {
		remove_blocker(&self.inner, id);
	}

	/// Whether any stored blocker blocks the queried scope(s): a global
	/// blocker blocks every query, otherwise the scope lists must intersect.
	pub fn is_blocked(&self, scope: impl Into<Scope>) -> bool {
		let query = scope.into();
		let blockers = self.inner.blockers.lock().unwrap();
		blockers.values().any(|entry| entry.state.scope.is_global() || entry.state.scope.intersects(&query))
	}

	/// Every blocker whose scope is global or contains `scope`, annotated
	/// with its id, sorted by priority descending.
	pub fn blocking_info(&self, scope: &str) -> Vec<BlockerInfo> {
		let mut matching: Vec<BlockerInfo> = {
			let blockers = self.inner.blockers.lock().unwrap();
			blockers
				.iter()
				.filter(|(_, entry)| entry.state.scope.is_global() || entry.state.scope.contains(scope))
				.map(|(id, entry)| BlockerInfo::new(id.clone(), entry.state.clone()))
				.collect()
		};
		matching.sort_by(|a, b| b.state.priority.cmp(&a.state.priority));
		matching
	}

	/// Remove every blocker, cancelling all timers. Dispatches one `clear`
	/// event with the count, and nothing when the registry was already empty.
	pub fn clear_all(&self) {
		let count = {
			let mut blockers = self.inner.blockers.lock().unwrap();
			let count = blockers.len();
			blockers.clear();
			count
		};

		if count > 0 {
			let mut event = BlockerEvent::new(Action::Clear, Clock::now());
			event.count = Some(count);
			emit(&self.inner, event);
		}
	}

	/// Remove every blocker whose normalized scope list contains exactly
	/// `scope`.
	///
	/// Membership, not blocking logic, governs removal here: a blocker scoped
	/// `"global"` blocks every scope yet survives any non-global
	/// `clear_scope` call.
	pub fn clear_scope(&self, scope: &str) {
		let count = {
			let mut blockers = self.inner.blockers.lock().unwrap();
			let ids: Vec<String> = blockers
				.iter()
				.filter(|(_, entry)| entry.state.scope.contains(scope))
				.map(|(id, _)| id.clone())
				.collect();
			for id in &ids {
				blockers.remove(id);
			}
			ids.len()
		};

		if count > 0 {
			let mut event = BlockerEvent::new(Action::ClearScope, Clock::now());
			event.scope = Some(scope.to_owned());
			event.count = Some(count);
			emit(&self.inner, event);
		}
	}

	/// Insert or replace the middleware under `name`. Re-registration is a
	/// fresh insertion at the end of the invocation order.
	pub fn register_middleware(&self, name: impl Into<String>, middleware: impl Middleware + 'static) {
		self.inner.pipeline.lock().unwrap().register(name, Arc::new(middleware));
	}

	/// Remove the middleware under `name`. No-op if absent.
	pub fn unregister_middleware(&self, name: &str) {
		self.inner.pipeline.lock().unwrap().unregister(name);
	}

	/// Snapshot of the blocker under `id`, if present.
	pub fn get(&self, id: &str) -> Option<Blocker> {
		self.inner.blockers.lock().unwrap().get(id).map(|entry| entry.state.clone())
	}

	pub fn len(&self) -> usize {
		self.inner.blockers.lock().unwrap().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Monotonic counter bumped on every state-changing mutation. A binding
	/// layer can poll it to decide when to re-run queries.
	pub fn revision(&self) -> u64 {
		self.inner.revision.load(Ordering::Relaxed)
	}
}

/// Queue `event` for dispatch against the pipeline as it stands right now.
fn emit(inner: &Inner, event: BlockerEvent) {
	inner.revision.fetch_add(1, Ordering::Relaxed);
	let chain = inner.pipeline.lock().unwrap().snapshot();
	if chain.is_empty() {
		return;
	}
	// The receiver only goes away when the instance itself is dropped.
	let _ = inner.events_tx.send(Envelope { event, chain });
}

/// Start the expiry timer for `Timeout::After`, returning the handle and the
/// epoch the firing will validate against. A rejected delay (above the
/// scheduling ceiling) is warned about and leaves the blocker timerless.
fn start_timer(inner: &Arc<Inner>, id: &str, timeout: Timeout) -> (Option<TimerHandle>, u64) {
	let epoch = inner.timer_epoch.fetch_add(1, Ordering::Relaxed);
	let Some(delay) = timeout.duration() else {
		return (None, epoch);
	};

	let weak = Arc::downgrade(inner);
	let fire_id = id.to_owned();
	match timer::schedule(&inner.runtime, delay, async move {
		if let Some(inner) = weak.upgrade() {
			fire_timeout(&inner, &fire_id, epoch);
		}
	}) {
		Ok(handle) => (Some(handle), epoch),
		Err(err) => {
			tracing::warn!(id, %err, "not scheduling expiry timer");
			(None, epoch)
		}
	}
}

/// A timer fired: invoke the blocker's callback, dispatch `timeout`, then
/// remove the record (which dispatches its own `remove`).
///
/// The epoch check makes firings of already-removed or replaced blockers
/// no-ops; the timer may have gone off concurrently with the cancellation.
fn fire_timeout(inner: &Arc<Inner>, id: &str, epoch: u64) {
	let (snapshot, callback) = {
		let blockers = inner.blockers.lock().unwrap();
		match blockers.get(id) {
			Some(entry) if entry.epoch == epoch => (entry.state.clone(), entry.on_timeout.clone()),
			_ => return,
		}
	};

	if let Some(callback) = &callback {
		callback.call(id);
	}

	let mut event = BlockerEvent::new(Action::Timeout, Clock::now());
	event.blocker_id = Some(id.to_owned());
	event.state = Some(snapshot);
	emit(inner, event);

	remove_blocker(inner, id);
}

fn remove_blocker(inner: &Inner, id: &str) {
	let removed = inner.blockers.lock().unwrap().remove(id);
	if let Some(entry) = removed {
		// Cancel before anything else, so a firing cannot land in between.
		if let Some(timer) = &entry.timer {
			timer.cancel();
		}
		let mut event = BlockerEvent::new(Action::Remove, Clock::now());
		event.blocker_id = Some(id.to_owned());
		event.prev_state = Some(entry.state);
		emit(inner, event);
	}
}
