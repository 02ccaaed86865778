//! File Store
//!
//! Keeps the whole collection as one pretty-printed JSON array.
//!
//! ## Responsibilities
//! - Read the full collection (missing file = empty collection)
//! - Replace the file atomically (temp file + rename)
//! - Heal legacy records on read and persist the healed form once
//!
//! No locking: one writer process is assumed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;

use crate::error::{Result, VaultError};
use crate::record::{derive_created_at, format_timestamp, parse_timestamp, IdGenerator, Record};

use super::query::{search_records, sort_records};
use super::{RecordStore, SortSpec};

/// A record as it may appear on disk, including legacy shapes
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    id: Value,

    #[serde(default)]
    name: Value,

    #[serde(default)]
    value: Value,

    #[serde(default, rename = "createdAt")]
    created_at: Option<Value>,
}

/// File-backed record provider
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Path of the JSON file holding the collection
    path: PathBuf,
}

impl FileStore {
    /// Create a store over `path`; nothing is touched until first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record from the backing file
    ///
    /// Returns an empty collection if the file does not exist. Legacy records
    /// are normalized in the returned data but the file is left as is.
    pub async fn read_all(&self) -> Result<Vec<Record>> {
        let (records, _) = self.read_normalized().await?;
        Ok(records)
    }

    /// Replace the backing file's content with `records`
    ///
    /// Writes a sibling temp file and renames it over the existing one, so a
    /// reader never sees a half-written collection.
    pub async fn write_all(&self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(records)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Load the collection, persisting any healing that was needed
    async fn load(&self) -> Result<Vec<Record>> {
        let (records, healed) = self.read_normalized().await?;
        if healed {
            tracing::info!(
                "Backfilled record metadata in {}, persisting healed collection",
                self.path.display()
            );
            self.write_all(&records).await?;
        }
        Ok(records)
    }

    /// Read and normalize; the flag is set if any record changed shape
    async fn read_normalized(&self) -> Result<(Vec<Record>, bool)> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), false)),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok((Vec::new(), false));
        }

        let stored: Vec<StoredRecord> = serde_json::from_slice(&bytes)?;
        tracing::debug!("Read {} records from {}", stored.len(), self.path.display());

        // Legacy records without a usable id get a fresh one past every
        // id already in the file.
        let ids = IdGenerator::new();
        for raw in &stored {
            if let Some(id) = coerce_id(&raw.id) {
                ids.observe(id);
            }
        }

        let mut healed = false;
        let mut records = Vec::with_capacity(stored.len());
        for (index, raw) in stored.into_iter().enumerate() {
            let had_id = coerce_id(&raw.id).is_some();
            let (record, changed) = normalize(raw, &ids);
            if !had_id {
                tracing::warn!(
                    "Record #{} in {} had no usable id, assigned {}",
                    index,
                    self.path.display(),
                    record.id
                );
            }
            healed |= changed;
            records.push(record);
        }

        Ok((records, healed))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn list(&self) -> Result<Vec<Record>> {
        self.load().await
    }

    async fn get(&self, id: i64) -> Result<Option<Record>> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|record| record.id == id))
    }

    async fn add(&self, record: Record) -> Result<Record> {
        let mut records = self.load().await?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(VaultError::DuplicateId(record.id));
        }

        records.push(record.clone());
        self.write_all(&records).await?;
        Ok(record)
    }

    async fn update(&self, id: i64, name: &str, value: &str) -> Result<Option<Record>> {
        let mut records = self.load().await?;
        let updated = match records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.name = name.to_string();
                record.value = value.to_string();
                record.clone()
            }
            None => return Ok(None),
        };

        self.write_all(&records).await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> Result<Option<Record>> {
        let mut records = self.load().await?;
        let position = match records.iter().position(|record| record.id == id) {
            Some(position) => position,
            None => return Ok(None),
        };

        let removed = records.remove(position);
        self.write_all(&records).await?;
        Ok(Some(removed))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Record>> {
        let records = self.load().await?;
        Ok(search_records(&records, keyword))
    }

    async fn sort(&self, spec: SortSpec) -> Result<Vec<Record>> {
        let records = self.load().await?;
        Ok(sort_records(&records, spec))
    }

    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        match fs::metadata(&self.path).await {
            Ok(metadata) => Ok(Some(DateTime::<Utc>::from(metadata.modified()?))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Turn a stored record into a `Record`
///
/// A record with no recoverable integer id is given one from `ids` and
/// stamped with the current time. The flag is set when the stored form
/// differs from the canonical one.
fn normalize(raw: StoredRecord, ids: &IdGenerator) -> (Record, bool) {
    let recovered = coerce_id(&raw.id);
    let id = recovered.unwrap_or_else(|| ids.generate());
    let mut changed = !raw.id.is_i64();

    let name = coerce_text(&raw.name);
    changed |= !raw.name.is_string();

    let value = coerce_text(&raw.value);
    changed |= !raw.value.is_string();

    let created_at = match raw.created_at.as_ref().and_then(Value::as_str) {
        Some(text) if parse_timestamp(text).is_some() => text.to_string(),
        _ => {
            changed = true;
            match recovered {
                Some(id) => derive_created_at(id),
                None => format_timestamp(Utc::now()),
            }
        }
    };

    (
        Record {
            id,
            name,
            value,
            created_at,
        },
        changed,
    )
}

/// Integer id from a number or numeric string
fn coerce_id(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Scalar coerced to its text form; null and missing become empty
fn coerce_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}
