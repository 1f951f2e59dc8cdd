#![allow(dead_code)]

use chrono::NaiveDate;
use friendtracker::{Event, EventLog, FixedClock, Store};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The "today" most calendar tests are pinned to.
pub fn today() -> NaiveDate {
    date(2000, 10, 20)
}

pub fn clock() -> FixedClock {
    FixedClock(today())
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn hang(store: &mut impl Store, day: NaiveDate, description: &str, friends: &[&str]) {
    store.create_hangout(day, description, &names(friends)).unwrap();
}

pub fn dummy_event(event_type: &str) -> Event {
    Event::new(event_type, serde_json::json!({"key": "value"}))
}

pub fn append_n(log: &mut EventLog, n: usize) {
    for i in 0..n {
        log.append(&dummy_event(&format!("event_{i}"))).unwrap();
    }
}

pub fn counter_reducer(state: u64, _event: &Event) -> u64 {
    state + 1
}
