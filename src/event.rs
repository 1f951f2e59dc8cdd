use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event type for a friend created or given a new contact frequency.
pub const FRIEND_UPDATED: &str = "friend_updated";

/// Event type for a hangout being recorded, together with its participants.
pub const HANGOUT_RECORDED: &str = "hangout_recorded";

/// An immutable record stored in the event log.
///
/// Events are serialized as single JSON lines in `events.jsonl`. Every store
/// mutation is exactly one event, so a mutation is either fully visible or
/// not visible at all.
///
/// # Examples
///
/// ```
/// use friendtracker::Event;
///
/// let event = Event::friend_updated("alice", Some(14)).unwrap();
/// assert_eq!(event.event_type, "friend_updated");
/// assert_eq!(event.data["frequency"], 14);
/// assert!(event.ts > 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct Event {
    /// The event type identifier, serialized as `"type"`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// JSON payload. Its shape depends on `event_type`; see
    /// [`FriendUpdated`] and [`HangoutRecorded`].
    pub data: Value,

    /// Unix timestamp in seconds at which the event was created.
    pub ts: u64,
}

/// Payload of a [`FRIEND_UPDATED`] event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FriendUpdated {
    pub name: String,
    #[serde(default)]
    pub frequency: Option<u32>,
}

/// Payload of a [`HANGOUT_RECORDED`] event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HangoutRecorded {
    pub date: NaiveDate,
    pub description: String,
    pub friends: BTreeSet<String>,
}

impl Event {
    /// Create a new event with the given type and data, stamped with the
    /// current time.
    pub fn new(event_type: &str, data: Value) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Event {
            event_type: event_type.to_string(),
            data,
            ts,
        }
    }

    /// A [`FRIEND_UPDATED`] event. `frequency` fully replaces any previous
    /// value, including replacing it with `None`.
    pub fn friend_updated(name: &str, frequency: Option<u32>) -> io::Result<Self> {
        let payload = FriendUpdated {
            name: name.to_string(),
            frequency,
        };
        Ok(Event::new(FRIEND_UPDATED, to_value(&payload)?))
    }

    /// A [`HANGOUT_RECORDED`] event.
    pub fn hangout_recorded(
        date: NaiveDate,
        description: &str,
        friends: BTreeSet<String>,
    ) -> io::Result<Self> {
        let payload = HangoutRecorded {
            date,
            description: description.to_string(),
            friends,
        };
        Ok(Event::new(HANGOUT_RECORDED, to_value(&payload)?))
    }

    /// Decode the payload into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidData` error if the payload does not have the
    /// expected shape.
    pub fn payload<T: DeserializeOwned>(&self) -> io::Result<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn to_value<T: Serialize>(payload: &T) -> io::Result<Value> {
    serde_json::to_value(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
