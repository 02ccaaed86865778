//! Snapshot/Export Manager
//!
//! Writes point-in-time backups after mutations and the plain-text export.
//!
//! ## Responsibilities
//! - One JSON backup per call, never overwriting an earlier one
//! - Backup failures are logged, never returned
//! - Deterministic text report for a given record list and generation time
//!
//! ## Export Layout
//! ```text
//! Record Vault Export
//! Generated: 2024-05-01T10:20:30.123Z
//! Total Records: 2
//! Source: vault.json
//! ==================================================
//! ID: 1714558830123 | Name: wifi | Value: secret1 | Created: 2024-05-01T10:20:30.123Z
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::record::{format_timestamp, Record};

pub const EXPORT_TITLE: &str = "Record Vault Export";
pub const EXPORT_SEPARATOR: &str = "==================================================";

/// Upper bound on same-timestamp suffixes tried before giving up
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes backups and exports under fixed locations
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    /// Directory receiving `backup_<timestamp>.json` files
    backup_dir: PathBuf,

    /// File overwritten by each export
    export_path: PathBuf,
}

impl SnapshotManager {
    pub fn new(backup_dir: impl Into<PathBuf>, export_path: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            export_path: export_path.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Back up `records`, returning the new file's path
    ///
    /// Any failure is logged and reported as `None`.
    pub async fn snapshot(&self, records: &[Record]) -> Option<PathBuf> {
        match self.write_snapshot(records, Utc::now()).await {
            Ok(path) => {
                tracing::debug!("Backup written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Backup to {} failed: {}", self.backup_dir.display(), e);
                None
            }
        }
    }

    /// Back up `records` as of `taken_at`, propagating failures
    pub async fn write_snapshot(&self, records: &[Record], taken_at: DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(&self.backup_dir).await?;
        let bytes = serde_json::to_vec_pretty(records)?;
        let stamp = filesystem_timestamp(taken_at);

        let mut attempt = 0;
        loop {
            let path = self.backup_dir.join(backup_file_name(&stamp, attempt));
            // create_new: an existing backup is never touched
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    if let Err(e) = write_and_flush(&mut file, &bytes).await {
                        drop(file);
                        // Never leave a truncated backup behind
                        if let Err(remove_error) = fs::remove_file(&path).await {
                            tracing::warn!(
                                "Cannot remove partial backup {}: {}",
                                path.display(),
                                remove_error
                            );
                        }
                        return Err(e.into());
                    }
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Write the text export, replacing any previous one
    pub async fn export_to_text(
        &self,
        records: &[Record],
        generated_at: DateTime<Utc>,
        source: &str,
    ) -> Result<PathBuf> {
        if let Some(parent) = self.export_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let report = render_export(records, generated_at, source);
        fs::write(&self.export_path, report).await?;
        tracing::info!("Exported {} records to {}", records.len(), self.export_path.display());
        Ok(self.export_path.clone())
    }
}

// =============================================================================
// Export Format
// =============================================================================

/// Render the export report
pub fn render_export(records: &[Record], generated_at: DateTime<Utc>, source: &str) -> String {
    let mut report = String::new();
    report.push_str(EXPORT_TITLE);
    report.push('\n');
    report.push_str(&format!("Generated: {}\n", format_timestamp(generated_at)));
    report.push_str(&format!("Total Records: {}\n", records.len()));
    report.push_str(&format!("Source: {}\n", source));
    report.push_str(EXPORT_SEPARATOR);
    report.push('\n');

    for record in records {
        report.push_str(&export_line(record));
        report.push('\n');
    }
    report
}

/// One report line for a record
///
/// Name and value are escaped (`\\`, `\|`, `\n`, `\r`) so every record
/// stays on one line and ` | ` only ever appears as a separator.
pub fn export_line(record: &Record) -> String {
    format!(
        "ID: {} | Name: {} | Value: {} | Created: {}",
        record.id,
        escape_field(&record.name),
        escape_field(&record.value),
        record.created_at
    )
}

/// Parse a record line back into a record
///
/// Returns `None` for header lines and anything else not shaped like a
/// record line.
pub fn parse_export_line(line: &str) -> Option<Record> {
    let rest = line.strip_prefix("ID: ")?;
    let (id, rest) = rest.split_once(" | Name: ")?;
    let (name, rest) = rest.split_once(" | Value: ")?;
    let (value, created_at) = rest.split_once(" | Created: ")?;

    Some(Record {
        id: id.trim().parse().ok()?,
        name: unescape_field(name),
        value: unescape_field(value),
        created_at: created_at.to_string(),
    })
}

fn escape_field(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_field(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

// =============================================================================
// Private Helpers
// =============================================================================

/// `2024-05-01T10:20:30.123Z` → `2024-05-01T10-20-30-123Z`
fn filesystem_timestamp(time: DateTime<Utc>) -> String {
    format_timestamp(time).replace([':', '.'], "-")
}

async fn write_and_flush(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

fn backup_file_name(stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("backup_{}.json", stamp)
    } else {
        format!("backup_{}_{}.json", stamp, attempt)
    }
}
