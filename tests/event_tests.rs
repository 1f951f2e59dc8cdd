mod common;

use common::date;
use friendtracker::{Event, FRIEND_UPDATED, FriendUpdated, HANGOUT_RECORDED, HangoutRecorded};
use serde_json::json;
use std::collections::BTreeSet;

#[test]
fn test_friend_updated_payload() {
    let event = Event::friend_updated("alice", Some(14)).unwrap();
    assert_eq!(event.event_type, FRIEND_UPDATED);
    let payload: FriendUpdated = event.payload().unwrap();
    assert_eq!(payload.name, "alice");
    assert_eq!(payload.frequency, Some(14));
}

#[test]
fn test_hangout_recorded_payload() {
    let friends: BTreeSet<String> = ["b".to_string(), "a".to_string()].into();
    let event = Event::hangout_recorded(date(2000, 10, 10), "park beers", friends.clone()).unwrap();
    assert_eq!(event.event_type, HANGOUT_RECORDED);
    assert_eq!(event.data["date"], "2000-10-10");
    assert_eq!(event.data["friends"], json!(["a", "b"]));

    let payload: HangoutRecorded = event.payload().unwrap();
    assert_eq!(payload.friends, friends);
}

#[test]
fn test_serialized_shape() {
    let event = Event::friend_updated("a", None).unwrap();
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "friend_updated");
    assert!(value.get("event_type").is_none());
    assert!(value["ts"].as_u64().unwrap() > 0);

    let back: Event = serde_json::from_value(value).unwrap();
    assert_eq!(back, event);
}

#[test]
fn test_missing_frequency_defaults_to_none() {
    let event: Event =
        serde_json::from_str(r#"{"type":"friend_updated","data":{"name":"a"},"ts":1}"#).unwrap();
    let payload: FriendUpdated = event.payload().unwrap();
    assert_eq!(payload.frequency, None);
}

#[test]
fn test_payload_shape_mismatch() {
    let event: Event =
        serde_json::from_str(r#"{"type":"hangout_recorded","data":{"date":"nope"},"ts":1}"#).unwrap();
    let err = event.payload::<HangoutRecorded>().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
