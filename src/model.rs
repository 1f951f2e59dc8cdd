use crate::error::{Error, Result};
use crate::event::{Event, FRIEND_UPDATED, FriendUpdated, HANGOUT_RECORDED, HangoutRecorded};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A tracked person, identified by their exact (case-sensitive) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    /// Desired number of days between hangouts. `None` or `Some(0)` means
    /// the cadence is not tracked.
    #[serde(default)]
    pub frequency: Option<u32>,
}

impl Friend {
    pub fn new(name: impl Into<String>, frequency: Option<u32>) -> Self {
        Friend {
            name: name.into(),
            frequency,
        }
    }

    /// The frequency, if it is positive.
    pub fn cadence(&self) -> Option<u32> {
        self.frequency.filter(|&days| days > 0)
    }

    pub fn tracks_cadence(&self) -> bool {
        self.cadence().is_some()
    }
}

/// A past or planned get-together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hangout {
    pub id: u64,
    pub date: NaiveDate,
    pub description: String,
    pub friends: BTreeSet<String>,
}

impl Hangout {
    pub fn includes(&self, name: &str) -> bool {
        self.friends.contains(name)
    }
}

/// Criteria for [`Store::list_hangouts`](crate::Store::list_hangouts).
/// Both date bounds are inclusive; unset fields don't filter.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use friendtracker::HangoutFilter;
///
/// let filter = HangoutFilter::new()
///     .since(NaiveDate::from_ymd_opt(2021, 5, 1).unwrap())
///     .with_friend("alice");
/// assert_eq!(filter.friend.as_deref(), Some("alice"));
/// assert!(filter.end.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HangoutFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub friend: Option<String>,
}

impl HangoutFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn until(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_friend(mut self, name: impl Into<String>) -> Self {
        self.friend = Some(name.into());
        self
    }

    pub fn matches(&self, hangout: &Hangout) -> bool {
        self.start.is_none_or(|start| hangout.date >= start)
            && self.end.is_none_or(|end| hangout.date <= end)
            && self
                .friend
                .as_deref()
                .is_none_or(|name| hangout.includes(name))
    }
}

/// Everything the store knows, folded from its events.
///
/// Friends and hangouts are kept in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub friends: Vec<Friend>,
    pub hangouts: Vec<Hangout>,
    pub next_id: u64,
}

impl Ledger {
    pub fn friend(&self, name: &str) -> Option<&Friend> {
        self.friends.iter().find(|f| f.name == name)
    }

    /// All friends when `names` is empty, otherwise those whose name is
    /// listed. Unknown names are skipped.
    pub fn list_friends(&self, names: &[&str]) -> Vec<Friend> {
        self.friends
            .iter()
            .filter(|f| names.is_empty() || names.contains(&f.name.as_str()))
            .cloned()
            .collect()
    }

    pub fn list_hangouts(&self, filter: &HangoutFilter) -> Vec<Hangout> {
        self.hangouts
            .iter()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect()
    }

    fn upsert(&mut self, name: &str, frequency: Option<u32>) {
        match self.friends.iter_mut().find(|f| f.name == name) {
            Some(friend) => friend.frequency = frequency,
            None => self.friends.push(Friend::new(name, frequency)),
        }
    }

    fn ensure_friend(&mut self, name: &str) {
        if self.friend(name).is_none() {
            self.friends.push(Friend::new(name, None));
        }
    }
}

/// Fold one event into the ledger.
///
/// A recorded hangout creates any participant not yet known, with no
/// frequency. Hangout ids are assigned here, counting from 1 in log order.
/// Malformed payloads and unknown event types are skipped.
pub fn ledger_reducer(mut state: Ledger, event: &Event) -> Ledger {
    match event.event_type.as_str() {
        FRIEND_UPDATED => match event.payload::<FriendUpdated>() {
            Ok(update) => state.upsert(&update.name, update.frequency),
            Err(e) => log::warn!("skipping malformed {} event: {e}", event.event_type),
        },
        HANGOUT_RECORDED => match event.payload::<HangoutRecorded>() {
            Ok(hang) => {
                for name in &hang.friends {
                    state.ensure_friend(name);
                }
                state.next_id += 1;
                state.hangouts.push(Hangout {
                    id: state.next_id,
                    date: hang.date,
                    description: hang.description,
                    friends: hang.friends,
                });
            }
            Err(e) => log::warn!("skipping malformed {} event: {e}", event.event_type),
        },
        _ => {}
    }
    state
}

/// Check a friend name before it is written to the store.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("friend name must not be empty"));
    }
    Ok(())
}

/// Build the event recording a hangout, rejecting empty participant lists.
pub(crate) fn hangout_event(
    date: NaiveDate,
    description: &str,
    friend_names: &[String],
) -> Result<Event> {
    if friend_names.is_empty() {
        return Err(Error::validation("a hangout needs at least one friend"));
    }
    for name in friend_names {
        validate_name(name)?;
    }
    let friends: BTreeSet<String> = friend_names.iter().cloned().collect();
    Ok(Event::hangout_recorded(date, description, friends)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_frequency_is_not_a_cadence() {
        assert!(!Friend::new("a", Some(0)).tracks_cadence());
        assert!(!Friend::new("a", None).tracks_cadence());
        assert_eq!(Friend::new("a", Some(3)).cadence(), Some(3));
    }

    #[test]
    fn reducer_assigns_ids_and_creates_participants() {
        let events = [
            Event::friend_updated("a", Some(2)).unwrap(),
            Event::hangout_recorded(date(2000, 10, 10), "park beers", ["a", "b"].map(String::from).into()).unwrap(),
            Event::hangout_recorded(date(2000, 10, 12), "skiing", ["c"].map(String::from).into()).unwrap(),
        ];
        let ledger = events.iter().fold(Ledger::default(), ledger_reducer);

        assert_eq!(ledger.hangouts.iter().map(|h| h.id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(
            ledger.friends,
            vec![
                Friend::new("a", Some(2)),
                Friend::new("b", None),
                Friend::new("c", None)
            ]
        );
    }

    #[test]
    fn reducer_ignores_unknown_and_malformed_events() {
        let events = [
            Event::new("friend_removed", serde_json::json!({"name": "a"})),
            Event::new(FRIEND_UPDATED, serde_json::json!({"frequency": 3})),
        ];
        let ledger = events.iter().fold(Ledger::default(), ledger_reducer);
        assert_eq!(ledger, Ledger::default());
    }

    #[test]
    fn duplicate_participants_collapse() {
        let names = vec!["a".to_string(), "a".to_string()];
        let event = hangout_event(date(2000, 1, 1), "x", &names).unwrap();
        let ledger = ledger_reducer(Ledger::default(), &event);
        assert_eq!(ledger.hangouts[0].friends.len(), 1);
        assert_eq!(ledger.friends.len(), 1);
    }

    #[test]
    fn empty_participant_list_is_rejected() {
        let err = hangout_event(date(2000, 1, 1), "x", &[]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let names = vec!["a".to_string(), "  ".to_string()];
        assert!(hangout_event(date(2000, 1, 1), "x", &names).is_err());
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let hang = Hangout {
            id: 1,
            date: date(2000, 10, 10),
            description: "x".into(),
            friends: ["a".to_string()].into(),
        };
        assert!(HangoutFilter::new().since(date(2000, 10, 10)).until(date(2000, 10, 10)).matches(&hang));
        assert!(!HangoutFilter::new().since(date(2000, 10, 11)).matches(&hang));
        assert!(!HangoutFilter::new().with_friend("b").matches(&hang));
    }
}
