//! Shared test infrastructure for integration tests.

use std::sync::OnceLock;

use blockade::{BlockerEvent, FnMiddleware, Registry};
use tokio::sync::mpsc;

static TRACING: OnceLock<()> = OnceLock::new();

/// Initialize tracing once for the whole test binary; directives come from
/// `RUST_LOG` as usual.
pub fn init_tracing() {
	TRACING.get_or_init(|| {
		let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_test_writer().try_init();
	});
}

/// Register a middleware under `name` that forwards every event into the
/// returned channel.
pub fn capture_events(registry: &Registry, name: &str) -> mpsc::UnboundedReceiver<BlockerEvent> {
	let (tx, rx) = mpsc::unbounded_channel();
	registry.register_middleware(name, FnMiddleware(move |event: &BlockerEvent| {
		let _ = tx.send(event.clone());
		Ok(())
	}));
	rx
}

/// Let queued dispatches and timer firings run on the current-thread runtime.
pub async fn settle() {
	for _ in 0..32 {
		tokio::task::yield_now().await;
	}
}
