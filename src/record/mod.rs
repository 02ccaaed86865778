//! Record Module
//!
//! The record shape shared by every backend, plus validation, id generation,
//! and the timestamp helpers used for `createdAt` backfill.
//!
//! ## Wire Shape
//! ```text
//! { "id": 1714558830123, "name": "wifi", "value": "secret1",
//!   "createdAt": "2024-05-01T10:20:30.123Z" }
//! ```

mod id;
mod validation;

pub use id::IdGenerator;
pub use validation::validate;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single vault record
///
/// `id` and `created_at` never change after creation; `name` and `value`
/// are replaced in place by updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub value: String,
    pub created_at: String,
}

impl Record {
    /// Create a record stamped with the given creation time
    pub fn new(id: i64, name: impl Into<String>, value: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            value: value.into(),
            created_at: format_timestamp(created_at),
        }
    }

    /// Parsed creation time, if `created_at` is a valid timestamp
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

// =============================================================================
// Timestamp Helpers
// =============================================================================

/// Render a timestamp as ISO-8601 UTC with millisecond precision
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// `createdAt` for a legacy record that lacks one
///
/// Ids are generation times in Unix milliseconds, so the id itself is the
/// best estimate. Falls back to now when the id is not a valid timestamp.
pub fn derive_created_at(id: i64) -> String {
    match Utc.timestamp_millis_opt(id).single() {
        Some(time) => format_timestamp(time),
        None => format_timestamp(Utc::now()),
    }
}
