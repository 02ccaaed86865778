//! # RecordVault
//!
//! A personal record vault with:
//! - One record API over a local JSON file or a MongoDB collection
//! - Time-derived ids and lazy `createdAt` backfill for legacy records
//! - Case-insensitive search and stable sorting
//! - Timestamped backups after mutations and a plain-text export
//! - Mutation events on a broadcast channel
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Interactive Menu                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    RecordService                             │
//! │      (validation, ids, events, snapshots, statistics)        │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//! ┌─────────────┐       ┌──────────────┐       ┌──────────────┐
//! │ RecordStore │       │   EventBus   │       │  Snapshot    │
//! │ File | Mongo│       │ (broadcast)  │       │  Manager     │
//! └─────────────┘       └──────────────┘       └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod events;
pub mod snapshot;
pub mod stats;
pub mod service;
pub mod menu;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, VaultError};
pub use config::{Backend, Config};
pub use record::Record;
pub use service::RecordService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RecordVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
