//! Development-only event inspector.
//!
//! When the `BLOCKADE_INSPECT` environment variable is set to anything
//! truthy, the default instance gets a built-in middleware that logs every
//! event as JSON under the `blockade::inspect` target. Compiled out of
//! release builds entirely.

use color_eyre::eyre::Result;

use crate::{
	event::BlockerEvent,
	middleware::FnMiddleware,
	registry::Registry,
};

pub(crate) const INSPECT_ENV: &str = "BLOCKADE_INSPECT";

pub(crate) fn maybe_attach(registry: &Registry) {
	let enabled = std::env::var(INSPECT_ENV).is_ok_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"));
	if !enabled {
		return;
	}

	registry.register_middleware("blockade-inspect", FnMiddleware(|event: &BlockerEvent| -> Result<()> {
		let json = serde_json::to_string(event)?;
		tracing::debug!(target: "blockade::inspect", %json, "event");
		Ok(())
	}));
}
