//! Record Service
//!
//! The backend-agnostic façade the CLI talks to.
//!
//! ## Responsibilities
//! - Pick the storage provider once, at open
//! - Validate input and issue ids
//! - Publish an event after every successful mutation
//! - Snapshot the collection after add and delete
//! - Export and statistics over whatever the provider returns

use chrono::Utc;

use crate::config::{Backend, Config};
use crate::error::{Result, VaultError};
use crate::events::{EventBus, VaultEvent};
use crate::record::{validate, IdGenerator, Record};
use crate::snapshot::SnapshotManager;
use crate::stats::VaultStatistics;
use crate::storage::{DocumentStore, FileStore, RecordStore, SortSpec};

/// Backend-agnostic record management
///
/// Holds exactly one provider for its whole lifetime; there is no runtime
/// switch between backends and no migration between them.
pub struct RecordService {
    /// The provider chosen at open
    store: Box<dyn RecordStore>,

    /// Backups and exports
    snapshots: SnapshotManager,

    /// Mutation notifications
    events: EventBus,

    /// Issues new record ids
    ids: IdGenerator,
}

impl RecordService {
    /// Fresh ids tried when the provider reports a clash
    const MAX_ID_ATTEMPTS: usize = 8;

    /// Build a service over an already-chosen provider
    pub fn new(store: Box<dyn RecordStore>, snapshots: SnapshotManager, events: EventBus) -> Self {
        Self {
            store,
            snapshots,
            events,
            ids: IdGenerator::new(),
        }
    }

    /// Open the service for `config`
    ///
    /// On startup:
    /// 1. Decide the backend from the connection string
    /// 2. For the document backend, connect now so a bad configuration
    ///    fails here instead of on the first command
    /// 3. Wire snapshots and events to the data directory and config
    pub async fn open(config: Config) -> Result<Self> {
        let store: Box<dyn RecordStore> = match config.backend() {
            Backend::File => {
                tracing::info!("Using file backend at {}", config.vault_path().display());
                Box::new(FileStore::new(config.vault_path()))
            }
            Backend::Document => {
                let store = DocumentStore::from_config(&config);
                store.ensure_connected().await?;
                Box::new(store)
            }
        };

        let snapshots = SnapshotManager::new(config.backup_dir(), config.export_path());
        let events = EventBus::new(config.event_capacity);
        Ok(Self::new(store, snapshots, events))
    }

    /// Add a record
    ///
    /// Steps:
    /// 1. Validate name and value
    /// 2. Stamp a fresh id and `createdAt`
    /// 3. Persist (retrying with a newer id on a clash)
    /// 4. Publish `recordAdded`
    /// 5. Snapshot the resulting collection
    pub async fn add(&self, name: &str, value: &str) -> Result<Record> {
        validate(name, value)?;

        let mut attempts = 0;
        let record = loop {
            let record = Record::new(self.ids.generate(), name, value, Utc::now());
            match self.store.add(record).await {
                Ok(record) => break record,
                Err(VaultError::DuplicateId(taken)) if attempts + 1 < Self::MAX_ID_ATTEMPTS => {
                    tracing::debug!("Id {} already taken, generating another", taken);
                    self.ids.observe(taken);
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!("Added record {}", record.id);
        self.events.publish(VaultEvent::RecordAdded(record.clone()));
        self.snapshot_collection().await;
        Ok(record)
    }

    /// All records, with metadata backfilled
    pub async fn list(&self) -> Result<Vec<Record>> {
        self.store.list().await
    }

    /// Replace name and value of record `id`
    ///
    /// Returns `Ok(None)` and changes nothing if the id is unknown, whatever
    /// the input; otherwise the input is validated like `add`.
    pub async fn update(&self, id: i64, name: &str, value: &str) -> Result<Option<Record>> {
        if self.store.get(id).await?.is_none() {
            return Ok(None);
        }
        validate(name, value)?;

        let updated = self.store.update(id, name, value).await?;
        if let Some(record) = &updated {
            tracing::info!("Updated record {}", record.id);
            self.events.publish(VaultEvent::RecordUpdated(record.clone()));
        }
        Ok(updated)
    }

    /// Delete record `id`
    ///
    /// Returns `Ok(None)` if the id is unknown. On success the post-delete
    /// collection is read back from the provider and snapshotted.
    pub async fn delete(&self, id: i64) -> Result<Option<Record>> {
        let removed = self.store.delete(id).await?;
        if let Some(record) = &removed {
            tracing::info!("Deleted record {}", record.id);
            self.events.publish(VaultEvent::RecordDeleted(record.clone()));
            self.snapshot_collection().await;
        }
        Ok(removed)
    }

    /// Records whose name, value, or id contains `keyword`, ignoring case
    pub async fn search(&self, keyword: &str) -> Result<Vec<Record>> {
        self.store.search(keyword).await
    }

    /// A sorted copy of the collection
    ///
    /// `field` is one of `id`, `name`, `value`, `createdAt`; `direction` is
    /// `desc` (any case) or ascending otherwise.
    pub async fn sort(&self, field: &str, direction: &str) -> Result<Vec<Record>> {
        self.sort_by(SortSpec::parse(field, direction)?).await
    }

    /// A sorted copy of the collection, from an already-parsed request
    pub async fn sort_by(&self, spec: SortSpec) -> Result<Vec<Record>> {
        self.store.sort(spec).await
    }

    /// Write the plain-text export and return its path
    pub async fn export_to_text(&self) -> Result<std::path::PathBuf> {
        let records = self.store.list().await?;
        self.snapshots
            .export_to_text(&records, Utc::now(), &self.store.source_name())
            .await
    }

    /// Collection statistics
    pub async fn statistics(&self) -> Result<VaultStatistics> {
        let records = self.store.list().await?;
        let last_modified = self.store.last_modified().await?;
        Ok(VaultStatistics::compute(&records, last_modified))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The event bus, for subscribing sinks
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Backup and export locations
    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    /// Name of the backing store
    pub fn source_name(&self) -> String {
        self.store.source_name()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Snapshot the provider's current collection; failures are only logged
    async fn snapshot_collection(&self) {
        match self.store.list().await {
            Ok(records) => {
                self.snapshots.snapshot(&records).await;
            }
            Err(e) => tracing::warn!("Skipping backup, cannot read collection: {}", e),
        }
    }
}
