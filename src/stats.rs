//! Vault statistics

use chrono::{DateTime, Utc};

use crate::record::{format_timestamp, Record};

/// Placeholder for values that do not apply
pub const NOT_AVAILABLE: &str = "N/A";

/// Summary of the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStatistics {
    pub total_records: usize,

    /// Backing file's modification time, or `N/A`
    pub last_modified: String,

    /// First longest name in collection order, or `N/A`
    pub longest_name: String,

    /// Length of `longest_name` in characters
    pub longest_name_length: usize,

    /// Oldest `createdAt`, or `N/A`
    pub earliest: String,

    /// Newest `createdAt`, or `N/A`
    pub latest: String,
}

impl VaultStatistics {
    /// Compute statistics over `records`
    pub fn compute(records: &[Record], last_modified: Option<DateTime<Utc>>) -> Self {
        let mut longest: Option<&Record> = None;
        for record in records {
            let length = record.name.chars().count();
            if longest.map_or(true, |best| length > best.name.chars().count()) {
                longest = Some(record);
            }
        }

        let mut created: Vec<(DateTime<Utc>, &str)> = records
            .iter()
            .filter_map(|record| record.created_at_time().map(|time| (time, record.created_at.as_str())))
            .collect();
        created.sort_by_key(|(time, _)| *time);

        Self {
            total_records: records.len(),
            last_modified: last_modified
                .map(format_timestamp)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            longest_name: longest
                .map(|record| record.name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            longest_name_length: longest.map_or(0, |record| record.name.chars().count()),
            earliest: created
                .first()
                .map(|(_, raw)| raw.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            latest: created
                .last()
                .map(|(_, raw)| raw.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}
