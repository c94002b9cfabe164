//! One-shot expiry timers.
//!
//! Each blocker with a timeout owns at most one [`TimerHandle`]. The handle
//! aborts its timer task when dropped, which makes "drop the entry" the single
//! cancellation primitive every removal path routes through.

use std::{future::Future, time::Duration};

use tokio::{runtime::Handle, task::JoinHandle};

/// Longest accepted delay, mirroring the common platform ceiling for
/// single-shot timers (2,147,483,647 ms ≈ 24.8 days). Longer delays are
/// rejected instead of wrapping or firing immediately.
pub const MAX_DELAY: Duration = Duration::from_millis(i32::MAX as u64);

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
	#[error("requested delay {0:?} exceeds the {MAX_DELAY:?} scheduling ceiling")]
	DelayTooLong(Duration),
}

/// Owner of one scheduled firing. Cancels on drop.
#[derive(Debug)]
pub struct TimerHandle {
	task: JoinHandle<()>,
}

impl TimerHandle {
	/// Cancel the pending firing. No-op if it already fired or was cancelled.
	pub fn cancel(&self) {
		self.task.abort();
	}
}

impl Drop for TimerHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}

/// Schedule `fire` to run once after `delay` on the given runtime.
///
/// Callers guard against zero/negative delays themselves; `schedule` only
/// enforces the upper ceiling.
pub fn schedule<F>(runtime: &Handle, delay: Duration, fire: F) -> Result<TimerHandle, ScheduleError>
where
	F: Future<Output = ()> + Send + 'static,
{
	if delay > MAX_DELAY {
		return Err(ScheduleError::DelayTooLong(delay));
	}

	// The countdown starts here, at the call, not when the task is first
	// polled.
	let deadline = tokio::time::Instant::now() + delay;
	let task = runtime.spawn(async move {
		tokio::time::sleep_until(deadline).await;
		fire.await;
	});

	Ok(TimerHandle { task })
}
