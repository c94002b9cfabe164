//! Ordered observer pipeline.
//!
//! Middleware are named callbacks invoked with a [`BlockerEvent`] after every
//! completed mutation. Dispatch is sequential in registration order, so
//! logging/analytics side effects stay deterministic, and each callback is
//! isolated: a failure or panic is reported and the rest of the chain still
//! runs. The mutation always precedes dispatch and is never rolled back.

use std::{panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use color_eyre::eyre::Result;
use futures::FutureExt;
use tokio::sync::mpsc;

use crate::event::BlockerEvent;

/// A named observer of registry mutations.
///
/// Implementations may do async work; the pipeline waits for each callback
/// before invoking the next one.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn handle(&self, event: &BlockerEvent) -> Result<()>;
}

/// Adapter turning a plain synchronous closure into a [`Middleware`].
pub struct FnMiddleware<F>(pub F);

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
	F: Fn(&BlockerEvent) -> Result<()> + Send + Sync,
{
	async fn handle(&self, event: &BlockerEvent) -> Result<()> {
		(self.0)(event)
	}
}

pub(crate) type Chain = Vec<(String, Arc<dyn Middleware>)>;

/// The ordered name → callback mapping owned by one registry instance.
#[derive(Default)]
pub(crate) struct Pipeline {
	entries: Chain,
}

impl Pipeline {
	/// Insert `middleware` under `name`.
	///
	/// Re-registering an existing name is a fresh insertion: the old entry is
	/// dropped and the callback joins the end of the invocation order.
	pub fn register(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
		let name = name.into();
		self.entries.retain(|(existing, _)| existing != &name);
		self.entries.push((name, middleware));
	}

	/// Remove the callback under `name`. No-op if absent.
	pub fn unregister(&mut self, name: &str) {
		self.entries.retain(|(existing, _)| existing != name);
	}

	pub fn snapshot(&self) -> Chain {
		self.entries.clone()
	}
}

/// One queued dispatch: the event plus the chain as it stood at mutation time.
pub(crate) struct Envelope {
	pub event: BlockerEvent,
	pub chain: Chain,
}

/// Invoke every callback in the chain, in order, waiting for each in turn.
pub(crate) async fn dispatch(event: &BlockerEvent, chain: &Chain) {
	for (name, middleware) in chain {
		match AssertUnwindSafe(middleware.handle(event)).catch_unwind().await {
			Ok(Ok(())) => {}
			Ok(Err(err)) => tracing::warn!(middleware = %name, action = %event.action, "middleware failed: {err:#}"),
			Err(_) => tracing::warn!(middleware = %name, action = %event.action, "middleware panicked"),
		}
	}
}

/// Drain the event queue of one registry instance, dispatching sequentially.
/// Exits once every sender is gone, i.e. when the owning registry is dropped.
pub(crate) async fn pump(mut rx: mpsc::UnboundedReceiver<Envelope>) {
	while let Some(envelope) = rx.recv().await {
		dispatch(&envelope.event, &envelope.chain).await;
	}
}
