//! Search and sort semantics shared by in-memory providers
//!
//! - `id` sorts numerically, `createdAt` as a timestamp, everything else as
//!   lowercased text
//! - Sorting is stable and always works on a copy
//! - Search is a case-insensitive substring match on name and value, plus
//!   plain containment on the id's decimal text

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VaultError};
use crate::record::{parse_timestamp, Record};

/// Field a collection can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Value,
    CreatedAt,
}

impl SortField {
    /// Field name as stored (`createdAt`, not `created_at`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Value => "value",
            SortField::CreatedAt => "createdAt",
        }
    }
}

impl FromStr for SortField {
    type Err = VaultError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "value" => Ok(SortField::Value),
            "createdat" | "created_at" | "created" => Ok(SortField::CreatedAt),
            other => Err(VaultError::validation(format!("unknown sort field '{}'", other))),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction; anything other than `desc` means ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction, case-insensitively
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A requested ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Build a sort request from user-facing strings
    pub fn parse(field: &str, direction: &str) -> Result<Self> {
        Ok(Self::new(field.parse()?, SortDirection::parse(direction)))
    }
}

// =============================================================================
// Search
// =============================================================================

/// Whether a record matches a search keyword
pub fn matches_keyword(record: &Record, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    record.name.to_lowercase().contains(&needle)
        || record.value.to_lowercase().contains(&needle)
        || record.id.to_string().contains(keyword)
}

/// Records matching `keyword`, in collection order
pub fn search_records(records: &[Record], keyword: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|record| matches_keyword(record, keyword))
        .cloned()
        .collect()
}

// =============================================================================
// Sort
// =============================================================================

/// A stably sorted copy of `records`
pub fn sort_records(records: &[Record], spec: SortSpec) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_by_field(a, b, spec.field);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Compare two records on one field, ascending
pub fn compare_by_field(a: &Record, b: &Record, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Value => a.value.to_lowercase().cmp(&b.value.to_lowercase()),
        // Unparseable timestamps sort first
        SortField::CreatedAt => parse_timestamp(&a.created_at).cmp(&parse_timestamp(&b.created_at)),
    }
}
