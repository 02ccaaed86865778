//! Storage Module
//!
//! Interchangeable record providers behind one async contract.
//!
//! ## Responsibilities
//! - Define the provider contract (`RecordStore`) the service talks to
//! - File provider: whole collection in one JSON file, scanned in memory
//! - Document provider: MongoDB collection, filtered and sorted server-side
//! - Shared search/sort semantics for in-memory providers
//! - Document mapping for the MongoDB provider (`mapping`)
//!
//! ## Providers
//! ```text
//!              ┌───────────────────┐
//!              │   RecordService   │
//!              └─────────┬─────────┘
//!                        │ dyn RecordStore
//!          ┌─────────────┴─────────────┐
//!          ▼                           ▼
//!   ┌─────────────┐             ┌──────────────┐
//!   │  FileStore  │             │DocumentStore │
//!   │ vault.json  │             │  (MongoDB)   │
//!   └─────────────┘             └──────────────┘
//! ```

mod document;
mod file;
pub mod mapping;
pub mod query;

pub use document::DocumentStore;
pub use file::FileStore;
pub use query::{SortDirection, SortField, SortSpec};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::record::Record;

/// Contract every storage backend satisfies
///
/// Providers return fully-formed records: `createdAt` is always present and
/// no backend-specific fields leak out. A missing id is `Ok(None)`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records in storage order
    async fn list(&self) -> Result<Vec<Record>>;

    /// The record with `id`, if any
    async fn get(&self, id: i64) -> Result<Option<Record>>;

    /// Persist a new record
    ///
    /// Fails with `VaultError::DuplicateId` if the id is already taken.
    async fn add(&self, record: Record) -> Result<Record>;

    /// Replace name and value of the record with `id`
    async fn update(&self, id: i64, name: &str, value: &str) -> Result<Option<Record>>;

    /// Remove the record with `id`, returning it
    async fn delete(&self, id: i64) -> Result<Option<Record>>;

    /// Case-insensitive match on name, value, or id substring
    async fn search(&self, keyword: &str) -> Result<Vec<Record>>;

    /// A sorted copy of the collection
    async fn sort(&self, spec: SortSpec) -> Result<Vec<Record>>;

    /// When the backing store last changed, if the backend can tell
    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>>;

    /// Human-readable name of the backing store, used in exports
    fn source_name(&self) -> String;
}
