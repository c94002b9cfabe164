//! Shared registry of named UI blockers.
//!
//! A blocker is a named demand that one or more scopes (a form, a page
//! region, or the whole application via the `"global"` sentinel) be
//! considered busy/disabled. Blockers are ranked by priority and can expire
//! automatically on a timeout. The registry only reports state — callers are
//! responsible for actually disabling their UI.
//!
//! # Module Structure
//!
//! - `scope`: scope values and their normalization
//! - `timer`: one-shot expiry timers with a scheduling ceiling
//! - `event` / `middleware`: the observer pipeline fed after every mutation
//! - `registry`: the central id → blocker map and its operations
//! - `instance`: the process-wide default instance
//!
//! # Example
//!
//! ```no_run
//! use blockade::{BlockerConfig, Registry, Scope, Timeout};
//!
//! #[tokio::main]
//! async fn main() {
//! 	let registry = Registry::new();
//! 	registry.add("autosave", BlockerConfig {
//! 		scope: Scope::from("editor"),
//! 		reason: "Saving draft".into(),
//! 		priority: 10,
//! 		timeout: Timeout::from_millis(5_000),
//! 		..Default::default()
//! 	});
//!
//! 	assert!(registry.is_blocked("editor"));
//! 	let top = &registry.blocking_info("editor")[0];
//! 	assert_eq!(top.state.reason, "Saving draft");
//! }
//! ```

pub mod event;
mod instance;
pub mod middleware;
pub mod registry;
pub mod scope;
pub mod timer;

#[cfg(debug_assertions)]
mod inspect;

#[cfg(test)]
pub(crate) mod mocks;

// Re-export the public API at the crate root for convenience
pub use event::{Action, BlockerEvent};
pub use instance::registry;
pub use middleware::{FnMiddleware, Middleware};
pub use registry::{Blocker, BlockerConfig, BlockerInfo, BlockerPatch, OnTimeout, Registry, Timeout};
pub use scope::{GLOBAL_SCOPE, Scope};
