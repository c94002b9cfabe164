//! Auto-expiry behavior, driven deterministically on a paused clock.

use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

use blockade::{Action, BlockerConfig, BlockerEvent, BlockerPatch, OnTimeout, Registry, Scope, Timeout};
use tokio::{sync::mpsc, time::advance};

use crate::common::{capture_events, settle};

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

/// A blocker with the given timeout plus a recorder of callback invocations.
fn expiring(registry: &Registry, id: &str, timeout_ms: i64) -> Arc<Mutex<Vec<String>>> {
	let fired = Arc::new(Mutex::new(Vec::new()));
	let recorder = Arc::clone(&fired);
	registry.add(id, BlockerConfig {
		scope: Scope::from("page"),
		timeout: Timeout::from_millis(timeout_ms),
		on_timeout: Some(OnTimeout::new(move |id| recorder.lock().unwrap().push(id.to_owned()))),
		..Default::default()
	});
	fired
}

fn drain(rx: &mut mpsc::UnboundedReceiver<BlockerEvent>) -> Vec<Action> {
	let mut actions = Vec::new();
	while let Ok(event) = rx.try_recv() {
		actions.push(event.action);
	}
	actions
}

#[tokio::test(start_paused = true)]
async fn test_present_until_deadline_then_gone() {
	let registry = Registry::new();
	let fired = expiring(&registry, "slow-save", 1000);

	advance(ms(999)).await;
	settle().await;
	assert!(registry.is_blocked("page"));
	assert!(fired.lock().unwrap().is_empty());

	advance(ms(1)).await;
	settle().await;
	assert!(!registry.is_blocked("page"));
	// The callback fired exactly once, with the blocker id.
	assert_eq!(*fired.lock().unwrap(), ["slow-save"]);

	advance(ms(10_000)).await;
	settle().await;
	assert_eq!(fired.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_dispatches_timeout_then_remove() {
	let registry = Registry::new();
	let mut rx = capture_events(&registry, "capture");
	let _fired = expiring(&registry, "b", 100);

	advance(ms(100)).await;
	settle().await;

	assert_eq!(drain(&mut rx), [Action::Add, Action::Timeout, Action::Remove]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_event_carries_snapshot() {
	let registry = Registry::new();
	let mut rx = capture_events(&registry, "capture");
	registry.add("b", BlockerConfig {
		scope: Scope::from("page"),
		reason: "expiring".into(),
		priority: 4,
		timeout: Timeout::from_millis(50),
		..Default::default()
	});

	advance(ms(50)).await;
	settle().await;

	let events: Vec<BlockerEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
	let timeout_event = events.iter().find(|e| e.action == Action::Timeout).expect("timeout event");
	assert_eq!(timeout_event.blocker_id.as_deref(), Some("b"));
	let state = timeout_event.state.as_ref().unwrap();
	assert_eq!(state.reason, "expiring");
	assert_eq!(state.priority, 4);
	assert_eq!(state.timeout, Timeout::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_update_with_new_timeout_restarts_countdown() {
	let registry = Registry::new();
	let fired = expiring(&registry, "b", 1000);

	advance(ms(500)).await;
	settle().await;
	registry.update("b", BlockerPatch { timeout: Some(Timeout::from_millis(1500)), ..Default::default() });

	// The old deadline passes without a firing.
	advance(ms(1499)).await;
	settle().await;
	assert!(registry.is_blocked("page"));
	assert!(fired.lock().unwrap().is_empty());

	advance(ms(1)).await;
	settle().await;
	assert!(!registry.is_blocked("page"));
	assert_eq!(fired.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_update_without_timeout_keeps_deadline() {
	let registry = Registry::new();
	let fired = expiring(&registry, "b", 1000);

	advance(ms(500)).await;
	settle().await;
	registry.update("b", BlockerPatch { reason: Some("still going".into()), ..Default::default() });

	advance(ms(500)).await;
	settle().await;
	assert!(!registry.is_blocked("page"));
	assert_eq!(*fired.lock().unwrap(), ["b"]);
}

#[tokio::test(start_paused = true)]
async fn test_update_timeout_never_cancels_without_removing() {
	let registry = Registry::new();
	let fired = expiring(&registry, "b", 1000);

	registry.update("b", BlockerPatch { timeout: Some(Timeout::from_millis(0)), ..Default::default() });

	advance(ms(60_000)).await;
	settle().await;
	assert!(registry.is_blocked("page"));
	assert!(fired.lock().unwrap().is_empty());
	assert_eq!(registry.get("b").unwrap().timeout, Timeout::Never);
}

#[tokio::test(start_paused = true)]
async fn test_readd_cancels_previous_timer() {
	let registry = Registry::new();
	let fired = expiring(&registry, "b", 1000);

	registry.add("b", BlockerConfig { scope: Scope::from("page"), ..Default::default() });

	advance(ms(5_000)).await;
	settle().await;
	// The replacement has no timeout, so the old timer must not fire.
	assert!(registry.is_blocked("page"));
	assert!(fired.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remove_before_expiry_suppresses_firing() {
	let registry = Registry::new();
	let mut rx = capture_events(&registry, "capture");
	let fired = expiring(&registry, "b", 1000);

	advance(ms(500)).await;
	settle().await;
	registry.remove("b");

	advance(ms(5_000)).await;
	settle().await;
	assert!(fired.lock().unwrap().is_empty());
	assert_eq!(drain(&mut rx), [Action::Add, Action::Remove]);
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_cancels_timers() {
	let registry = Registry::new();
	let fired_a = expiring(&registry, "a", 1000);
	let fired_b = expiring(&registry, "b", 2000);

	registry.clear_all();

	advance(ms(10_000)).await;
	settle().await;
	assert!(fired_a.lock().unwrap().is_empty());
	assert!(fired_b.lock().unwrap().is_empty());
	assert!(registry.is_empty());
}
