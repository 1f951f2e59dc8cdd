//! Projections over the hangout history: what happened recently, who is
//! overdue for a catch-up, and who is coming up.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{Friend, HangoutFilter};
use crate::store::Store;
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::iter;

/// Days either side of today covered by the unfiltered calendar.
pub const DEFAULT_WINDOW_DAYS: u64 = 7;

/// How many of a friend's latest hangouts the filtered calendar reaches back
/// over.
pub const RECENT_HANGOUTS_SHOWN: usize = 3;

/// Hangouts grouped by `(date, description)`, each with its sorted
/// participant names.
pub type RecentHangs = BTreeMap<(NaiveDate, String), Vec<String>>;

/// Friend names bucketed by the date contact is due, in evaluation order.
pub type DueDates = BTreeMap<NaiveDate, Vec<String>>;

/// Friends with a tracked cadence, split by whether contact is already late.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub overdue: DueDates,
    pub upcoming: DueDates,
}

/// The date range a calendar reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First date whose hangouts are listed as recent.
    pub since: NaiveDate,
    /// Last due date still reported as overdue or upcoming.
    pub end: NaiveDate,
}

/// The calendar engine. Holds no state beyond the store and clock it reads.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use friendtracker::{Calendar, FixedClock, MemoryStore, Store};
///
/// let today = NaiveDate::from_ymd_opt(2000, 10, 20).unwrap();
/// let mut store = MemoryStore::new();
/// store.upsert_friend("a", Some(2)).unwrap();
/// store
///     .create_hangout(NaiveDate::from_ymd_opt(2000, 10, 10).unwrap(), "park beers", &["a".to_string()])
///     .unwrap();
///
/// let clock = FixedClock(today);
/// let calendar = Calendar::new(&store, &clock);
/// let lines: Vec<String> = calendar.render_calendar(None).unwrap().collect();
/// assert_eq!(lines, ["Overdue:", "\t2000-10-12: a"]);
/// ```
pub struct Calendar<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S, C> Calendar<'a, S, C>
where
    S: Store + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Calendar { store, clock }
    }

    /// Hangouts dated on or after `since`, merged by `(date, description)`.
    ///
    /// Hangouts that share a date and description are treated as one event
    /// even when recorded separately. With `friend_filter`, only groups that
    /// friend took part in are kept.
    pub fn recent_hangs(&self, friend_filter: Option<&str>, since: NaiveDate) -> Result<RecentHangs> {
        let mut groups: BTreeMap<(NaiveDate, String), BTreeSet<String>> = BTreeMap::new();
        for hang in self.store.list_hangouts(&HangoutFilter::new().since(since))? {
            groups
                .entry((hang.date, hang.description))
                .or_default()
                .extend(hang.friends);
        }

        if let Some(name) = friend_filter {
            groups.retain(|_, names| names.contains(name));
        }

        Ok(groups
            .into_iter()
            .map(|(key, names)| (key, names.into_iter().collect()))
            .collect())
    }

    /// Bucket every friend with a cadence by the date they are next due.
    ///
    /// A friend never seen is due today. Otherwise the due date is their
    /// latest hangout plus their frequency: dates past `end` are dropped,
    /// dates before today are overdue and the rest upcoming.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `friend_filter` names no known friend.
    pub fn overdue_and_upcoming(&self, friend_filter: Option<&str>, end: NaiveDate) -> Result<Projection> {
        let today = self.clock.today();
        let friends = self.friends(friend_filter)?;
        let last_seen = self.last_hangout_dates(friend_filter)?;

        let mut projection = Projection::default();
        for friend in friends {
            let Some(days) = friend.cadence() else {
                continue;
            };
            let Some(last) = last_seen.get(friend.name.as_str()) else {
                projection.upcoming.entry(today).or_default().push(friend.name);
                continue;
            };
            let Some(next_due) = last.checked_add_days(Days::new(u64::from(days))) else {
                continue;
            };
            if next_due > end {
                continue;
            }
            let bucket = if next_due < today {
                &mut projection.overdue
            } else {
                &mut projection.upcoming
            };
            bucket.entry(next_due).or_default().push(friend.name);
        }
        Ok(projection)
    }

    /// The window [`render_calendar`](Self::render_calendar) reports on.
    ///
    /// Unfiltered, a week either side of today. For one friend, from their
    /// third most recent hangout (or earliest, or today if there are none)
    /// to today plus their frequency.
    pub fn window(&self, friend_filter: Option<&str>) -> Result<Window> {
        let today = self.clock.today();
        let Some(name) = friend_filter else {
            let days = Days::new(DEFAULT_WINDOW_DAYS);
            return Ok(Window {
                since: today.checked_sub_days(days).unwrap_or(today),
                end: today.checked_add_days(days).unwrap_or(today),
            });
        };

        let friend = self.friend(name)?;
        let mut dates: Vec<NaiveDate> = self
            .store
            .list_hangouts(&HangoutFilter::new().with_friend(name))?
            .into_iter()
            .map(|h| h.date)
            .collect();
        dates.sort_unstable();

        let since = dates
            .len()
            .checked_sub(RECENT_HANGOUTS_SHOWN)
            .map_or(dates.first(), |i| dates.get(i))
            .copied()
            .unwrap_or(today);
        let days = Days::new(u64::from(friend.frequency.unwrap_or(0)));
        Ok(Window {
            since,
            end: today.checked_add_days(days).unwrap_or(NaiveDate::MAX),
        })
    }

    /// Compute the calendar and return its text lines.
    ///
    /// Sections are `Past:`, `Overdue:` and `Upcoming:`, in that order;
    /// empty sections are left out. Everything is read from the store on
    /// each call.
    pub fn render_calendar(&self, friend_filter: Option<&str>) -> Result<CalendarLines> {
        let window = self.window(friend_filter)?;
        let recent = self.recent_hangs(friend_filter, window.since)?;
        let Projection { overdue, upcoming } = self.overdue_and_upcoming(friend_filter, window.end)?;
        log::debug!(
            "calendar {}..{}: {} recent, {} overdue, {} upcoming",
            window.since,
            window.end,
            recent.len(),
            overdue.len(),
            upcoming.len()
        );

        let past = recent.into_iter().flat_map(|((date, description), names)| {
            iter::once(format!("\t{date}: {description}"))
                .chain(names.into_iter().map(|name| format!("\t\t{name}")))
        });
        let lines = section("Past:", past)
            .chain(section("Overdue:", due_lines(overdue)))
            .chain(section("Upcoming:", due_lines(upcoming)));

        Ok(CalendarLines {
            inner: Box::new(lines),
        })
    }

    fn friend(&self, name: &str) -> Result<Friend> {
        self.store
            .list_friends(&[name])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::unknown_friend(name))
    }

    fn friends(&self, friend_filter: Option<&str>) -> Result<Vec<Friend>> {
        match friend_filter {
            Some(name) => Ok(vec![self.friend(name)?]),
            None => self.store.list_friends(&[]),
        }
    }

    fn last_hangout_dates(&self, friend_filter: Option<&str>) -> Result<HashMap<String, NaiveDate>> {
        let filter = match friend_filter {
            Some(name) => HangoutFilter::new().with_friend(name),
            None => HangoutFilter::new(),
        };
        let mut last_seen: HashMap<String, NaiveDate> = HashMap::new();
        for hang in self.store.list_hangouts(&filter)? {
            for name in hang.friends {
                let latest = last_seen.entry(name).or_insert(hang.date);
                *latest = (*latest).max(hang.date);
            }
        }
        Ok(last_seen)
    }
}

/// The rendered calendar, produced one line at a time.
pub struct CalendarLines {
    inner: Box<dyn Iterator<Item = String>>,
}

impl Iterator for CalendarLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }
}

impl fmt::Debug for CalendarLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarLines").finish_non_exhaustive()
    }
}

/// Prefix `body` with `header`, unless `body` is empty.
fn section(header: &'static str, body: impl Iterator<Item = String>) -> impl Iterator<Item = String> {
    let mut body = body.peekable();
    let header = body.peek().is_some().then(|| header.to_string());
    header.into_iter().chain(body)
}

fn due_lines(dates: DueDates) -> impl Iterator<Item = String> {
    dates
        .into_iter()
        .map(|(date, names)| format!("\t{date}: {}", names.join(", ")))
}
