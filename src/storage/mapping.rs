//! Document Mapping
//!
//! Conversions between `Record` and the MongoDB document shape, plus the
//! query documents the document provider sends. Nothing here touches the
//! network.
//!
//! ## Legacy Shapes
//! - `id` stored as a double or numeric string
//! - `value` stored as a number or bool
//! - `createdAt` missing, or stored as an ISO string instead of a Date

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{self, doc, Bson, Document, Regex};

use crate::record::{derive_created_at, format_timestamp, parse_timestamp, Record};

/// Canonical document for a record
pub fn record_to_document(record: &Record) -> Document {
    let created_at = record.created_at_time().unwrap_or_else(Utc::now);
    doc! {
        "id": record.id,
        "name": record.name.clone(),
        "value": record.value.clone(),
        "createdAt": bson::DateTime::from_millis(created_at.timestamp_millis()),
    }
}

/// Normalize a stored document into a record
///
/// Returns `None` for documents without a usable `id`. `createdAt` is
/// always filled in.
pub fn record_from_document(document: &Document) -> Option<Record> {
    let id = document.get("id").and_then(bson_to_id)?;

    let created_at = stored_created_at(document)
        .map(format_timestamp)
        .unwrap_or_else(|| derive_created_at(id));

    Some(Record {
        id,
        name: document.get("name").map(bson_to_text).unwrap_or_default(),
        value: document.get("value").map(bson_to_text).unwrap_or_default(),
        created_at,
    })
}

/// `createdAt` of a document, from a Date or an ISO string
pub fn stored_created_at(document: &Document) -> Option<DateTime<Utc>> {
    match document.get("createdAt")? {
        Bson::DateTime(time) => Utc.timestamp_millis_opt(time.timestamp_millis()).single(),
        Bson::String(text) => parse_timestamp(text),
        _ => None,
    }
}

/// Integer id from a numeric or numeric-string value
pub fn bson_to_id(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
        Bson::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Scalar coerced to text; whole doubles print without a fraction
pub fn bson_to_text(value: &Bson) -> String {
    match value {
        Bson::String(text) => text.clone(),
        Bson::Null | Bson::Undefined => String::new(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        Bson::Double(f) => f.to_string(),
        Bson::Boolean(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

/// Changes that bring a legacy document to the canonical shape
///
/// `id` is the record's id after healing. Returns an empty document when
/// nothing needs to change.
pub fn canonical_fields(document: &Document, id: i64, now: DateTime<Utc>) -> Document {
    let mut set = Document::new();
    if !matches!(document.get("id"), Some(Bson::Int64(stored)) if *stored == id) {
        set.insert("id", id);
    }

    if !matches!(document.get("createdAt"), Some(Bson::DateTime(_))) {
        let created_at = match (stored_created_at(document), document.get("id").and_then(bson_to_id)) {
            (Some(time), _) => time,
            (None, Some(stored_id)) => Utc.timestamp_millis_opt(stored_id).single().unwrap_or(now),
            (None, None) => now,
        };
        set.insert("createdAt", bson::DateTime::from_millis(created_at.timestamp_millis()));
    }
    set
}

/// Filter for documents that are not in canonical shape
pub fn legacy_filter() -> Document {
    doc! {
        "$or": [
            { "id": { "$not": { "$type": "long" } } },
            { "createdAt": { "$not": { "$type": "date" } } },
        ]
    }
}

// =============================================================================
// Search
// =============================================================================

/// Server-side filter matching name, value, or id substring
///
/// The keyword is matched literally. Name and value ignore case; a keyword
/// that is itself an integer also matches that id exactly.
pub fn search_filter(keyword: &str) -> Document {
    let pattern = regex::escape(keyword);
    let mut clauses = vec![
        doc! {
            "name": Bson::RegularExpression(Regex {
                pattern: pattern.clone(),
                options: "i".to_string(),
            })
        },
        doc! {
            "$expr": {
                "$regexMatch": {
                    "input": { "$toString": "$value" },
                    "regex": pattern.clone(),
                    "options": "i",
                }
            }
        },
        doc! {
            "$expr": {
                "$regexMatch": {
                    "input": { "$toString": "$id" },
                    "regex": pattern,
                }
            }
        },
    ];
    if let Ok(id) = keyword.trim().parse::<i64>() {
        clauses.push(doc! { "id": id });
    }

    doc! { "$or": clauses }
}

/// Keep the first record for each id, in order
pub fn dedup_by_id(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|record| seen.insert(record.id)).collect()
}
