use std::cell::Cell;

use jiff::Timestamp;

thread_local! {
	static MOCK_NOW: Cell<Option<Timestamp>> = const { Cell::new(None) };
}

pub struct MockClock;

impl MockClock {
	pub fn now() -> Timestamp {
		let ts = MOCK_NOW.with(|ts| ts.get());
		ts.unwrap_or_else(Timestamp::now)
	}
}

pub fn set_now(timestamp: Timestamp) {
	MOCK_NOW.with(|ts| ts.set(Some(timestamp)));
}
