//! The process-wide default registry instance.
//!
//! Ordinary callers never construct the default instance themselves: the
//! first call to [`registry`] creates it, and it lives for the rest of the
//! process. Isolated contexts (tests, sandboxed subtrees) construct their own
//! [`Registry`](crate::Registry) instead.

use std::sync::LazyLock;

use crate::registry::Registry;

static DEFAULT: LazyLock<Registry> = LazyLock::new(|| {
	let registry = Registry::new();
	#[cfg(debug_assertions)]
	crate::inspect::maybe_attach(&registry);
	registry
});

/// The process-wide default registry.
///
/// First access creates it and binds its event pump and timers to the tokio
/// runtime that is current at that moment, so touch it from the application's
/// long-lived runtime. Accessing it outside any runtime panics (see
/// [`Registry::new`]).
pub fn registry() -> &'static Registry {
	&DEFAULT
}
