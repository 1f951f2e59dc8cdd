//! Track hangouts with friends and see who you are due to catch up with.
//!
//! Hangouts and per-friend contact frequencies live in a [`Store`]; the
//! [`Calendar`] engine projects them into recent hangouts, overdue friends
//! and upcoming ones. [`FileStore`] persists everything as an append-only
//! JSONL event log with a snapshotted [`View`] over it.

mod calendar;
pub mod cli;
mod clock;
pub mod config;
mod dates;
mod error;
mod event;
mod log;
mod model;
mod store;
mod view;

pub use calendar::{
    Calendar, CalendarLines, DEFAULT_WINDOW_DAYS, DueDates, Projection, RECENT_HANGOUTS_SHOWN,
    RecentHangs, Window,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dates::parse_natural_date;
pub use error::{Error, Result};
pub use event::{Event, FRIEND_UPDATED, FriendUpdated, HANGOUT_RECORDED, HangoutRecorded};
pub use log::{EventLog, LockMode, LogLock, line_hash};
pub use model::{Friend, Hangout, HangoutFilter, Ledger, ledger_reducer};
pub use store::{FileStore, MemoryStore, Store};
pub use view::{ReduceFn, View};
