use crate::error::{Error, Result};
use crate::event::Event;
use crate::log::{EventLog, LockMode};
use crate::model::{self, Friend, Hangout, HangoutFilter, Ledger, ledger_reducer};
use crate::view::View;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::path::Path;

/// Data access used by the calendar engine and the CLI.
///
/// Reads never fail on unknown names; they simply match nothing. Each
/// mutation is applied atomically.
pub trait Store {
    /// All friends when `names` is empty, otherwise only the named ones that
    /// exist, in creation order.
    fn list_friends(&self, names: &[&str]) -> Result<Vec<Friend>>;

    /// Hangouts matching `filter`, in creation order.
    fn list_hangouts(&self, filter: &HangoutFilter) -> Result<Vec<Hangout>>;

    /// Create `name` or overwrite its frequency (`None` clears it).
    fn upsert_friend(&mut self, name: &str, frequency: Option<u32>) -> Result<Friend>;

    /// Record a hangout, creating any participant not yet known.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `friend_names` is empty or holds a blank name.
    fn create_hangout(
        &mut self,
        date: NaiveDate,
        description: &str,
        friend_names: &[String],
    ) -> Result<Hangout>;

    /// Removing a friend would orphan or rewrite their hangouts, and no
    /// semantics for that have been settled, so it is refused outright.
    fn remove_friend(&mut self, name: &str) -> Result<()> {
        log::debug!("refusing to remove '{name}'");
        Err(Error::Unsupported("removing friends"))
    }
}

/// A [`Store`] persisted as an event log in a data directory.
///
/// Reads hold a shared lock and writes an exclusive one, each for the
/// duration of a single call, so concurrent processes see whole mutations
/// only.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use friendtracker::{FileStore, HangoutFilter, Store};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = FileStore::open(dir.path()).unwrap();
/// let date = NaiveDate::from_ymd_opt(2000, 10, 10).unwrap();
/// store.create_hangout(date, "park beers", &["a".to_string(), "b".to_string()]).unwrap();
///
/// let hangouts = store.list_hangouts(&HangoutFilter::new()).unwrap();
/// assert_eq!(hangouts.len(), 1);
/// assert_eq!(store.list_friends(&[]).unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct FileStore {
    log: EventLog,
    view: RefCell<View<Ledger>>,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let log = EventLog::open(dir)?;
        let view = View::new("ledger", ledger_reducer, log.views_dir());
        Ok(FileStore {
            log,
            view: RefCell::new(view),
        })
    }

    /// Discard the cached snapshot and fold the whole log again.
    pub fn rebuild(&mut self) -> Result<()> {
        let _lock = self.log.lock(LockMode::Exclusive)?;
        self.view.get_mut().rebuild(&self.log)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T> {
        let _lock = self.log.lock(LockMode::Shared)?;
        let mut view = self.view.borrow_mut();
        let ledger = view.refresh(&self.log)?;
        Ok(f(ledger))
    }

    /// Validate against the current state, append the resulting event and
    /// return what `after` extracts from the updated state. The exclusive
    /// lock spans all three steps.
    fn write<T>(
        &mut self,
        build: impl FnOnce(&Ledger) -> Result<Event>,
        after: impl FnOnce(&Ledger) -> Option<T>,
    ) -> Result<T> {
        let _lock = self.log.lock(LockMode::Exclusive)?;
        let view = self.view.get_mut();
        let event = build(view.refresh(&self.log)?)?;
        self.log.append(&event)?;
        let ledger = view.refresh(&self.log)?;
        after(ledger).ok_or_else(|| {
            Error::Storage(std::io::Error::other(format!(
                "{} event was appended but is missing from {}",
                event.event_type,
                self.log.log_path().display()
            )))
        })
    }
}

impl Store for FileStore {
    fn list_friends(&self, names: &[&str]) -> Result<Vec<Friend>> {
        self.read(|ledger| ledger.list_friends(names))
    }

    fn list_hangouts(&self, filter: &HangoutFilter) -> Result<Vec<Hangout>> {
        self.read(|ledger| ledger.list_hangouts(filter))
    }

    fn upsert_friend(&mut self, name: &str, frequency: Option<u32>) -> Result<Friend> {
        model::validate_name(name)?;
        self.write(
            |ledger| {
                if ledger.friend(name).is_none() {
                    log::info!("adding friend '{name}'");
                }
                Ok(Event::friend_updated(name, frequency)?)
            },
            |ledger| ledger.friend(name).cloned(),
        )
    }

    fn create_hangout(
        &mut self,
        date: NaiveDate,
        description: &str,
        friend_names: &[String],
    ) -> Result<Hangout> {
        self.write(
            |ledger| {
                let event = model::hangout_event(date, description, friend_names)?;
                log_new_friends(ledger, friend_names);
                Ok(event)
            },
            |ledger| ledger.hangouts.last().cloned(),
        )
    }
}

/// A [`Store`] held entirely in memory, folding events through the same
/// reducer as [`FileStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ledger: Ledger,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn apply(&mut self, event: &Event) {
        self.ledger = ledger_reducer(std::mem::take(&mut self.ledger), event);
    }
}

impl Store for MemoryStore {
    fn list_friends(&self, names: &[&str]) -> Result<Vec<Friend>> {
        Ok(self.ledger.list_friends(names))
    }

    fn list_hangouts(&self, filter: &HangoutFilter) -> Result<Vec<Hangout>> {
        Ok(self.ledger.list_hangouts(filter))
    }

    fn upsert_friend(&mut self, name: &str, frequency: Option<u32>) -> Result<Friend> {
        model::validate_name(name)?;
        self.apply(&Event::friend_updated(name, frequency)?);
        Ok(Friend::new(name, frequency))
    }

    fn create_hangout(
        &mut self,
        date: NaiveDate,
        description: &str,
        friend_names: &[String],
    ) -> Result<Hangout> {
        let event = model::hangout_event(date, description, friend_names)?;
        log_new_friends(&self.ledger, friend_names);
        self.apply(&event);
        self.ledger
            .hangouts
            .last()
            .cloned()
            .ok_or_else(|| Error::validation("hangout was not recorded"))
    }
}

fn log_new_friends(ledger: &Ledger, names: &[String]) {
    for name in names {
        if ledger.friend(name).is_none() {
            log::info!("adding friend '{name}' from hangout");
        }
    }
}
