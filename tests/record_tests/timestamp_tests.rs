//! Tests for timestamp helpers and the Record shape
//!
//! These tests verify:
//! - ISO-8601 formatting with millisecond precision
//! - createdAt derivation from ids
//! - JSON field names on the wire

use chrono::{TimeZone, Utc};
use recordvault::record::{derive_created_at, format_timestamp, parse_timestamp, Record};

#[test]
fn test_format_timestamp_uses_millis_and_z() {
    let time = Utc.timestamp_millis_opt(1_714_558_830_123).unwrap();
    assert_eq!(format_timestamp(time), "2024-05-01T10:20:30.123Z");
}

#[test]
fn test_parse_timestamp_round_trips_format() {
    let time = Utc.timestamp_millis_opt(1_714_558_830_123).unwrap();
    assert_eq!(parse_timestamp(&format_timestamp(time)), Some(time));
}

#[test]
fn test_parse_timestamp_accepts_offsets() {
    let parsed = parse_timestamp("2024-05-01T12:20:30.123+02:00").unwrap();
    assert_eq!(format_timestamp(parsed), "2024-05-01T10:20:30.123Z");
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    assert_eq!(parse_timestamp("yesterday"), None);
    assert_eq!(parse_timestamp(""), None);
}

#[test]
fn test_derive_created_at_from_id() {
    assert_eq!(derive_created_at(1_714_558_830_123), "2024-05-01T10:20:30.123Z");
    assert_eq!(derive_created_at(0), "1970-01-01T00:00:00.000Z");
}

#[test]
fn test_derive_created_at_falls_back_to_now() {
    let before = Utc::now();
    let derived = parse_timestamp(&derive_created_at(i64::MAX)).unwrap();
    let after = Utc::now();

    // Millisecond truncation can put the derived time just before `before`
    assert!(derived.timestamp_millis() >= before.timestamp_millis());
    assert!(derived <= after);
}

#[test]
fn test_record_serializes_camel_case() {
    let record = Record::new(42, "wifi", "secret1", Utc.timestamp_millis_opt(0).unwrap());

    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "id": 42,
            "name": "wifi",
            "value": "secret1",
            "createdAt": "1970-01-01T00:00:00.000Z"
        })
    );
}
