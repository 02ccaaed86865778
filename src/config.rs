//! Configuration for RecordVault
//!
//! Centralized configuration with sensible defaults. The backend is decided
//! once from this struct: a connection string selects the document store,
//! its absence selects the local file store.

use std::path::PathBuf;

/// Main configuration for a RecordVault instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all local files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── vault.json       (file backend records)
    ///     ├── export.txt       (latest plain-text export)
    ///     └── backups/         (timestamped snapshots)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Document Store Configuration
    // -------------------------------------------------------------------------
    /// MongoDB connection string; presence selects the document backend
    pub connection_string: Option<String>,

    /// Database name; falls back to the connection string's default database
    pub database_name: Option<String>,

    /// Collection holding the records
    pub collection_name: String,

    // -------------------------------------------------------------------------
    // Event Configuration
    // -------------------------------------------------------------------------
    /// Events buffered per subscriber before it starts lagging
    pub event_capacity: usize,
}

/// Which storage provider a process uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Single JSON file under the data directory
    File,

    /// Remote MongoDB collection
    Document,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./vault_data"),
            connection_string: None,
            database_name: None,
            collection_name: "records".to_string(),
            event_capacity: 64,
        }
    }
}

impl Config {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    pub const VAULT_FILENAME: &'static str = "vault.json";
    pub const EXPORT_FILENAME: &'static str = "export.txt";
    pub const BACKUP_DIR: &'static str = "backups";
    pub const DEFAULT_DATABASE: &'static str = "recordvault";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Backend selected by this configuration
    ///
    /// Blank connection strings count as absent.
    pub fn backend(&self) -> Backend {
        match self.connection_string() {
            Some(_) => Backend::Document,
            None => Backend::File,
        }
    }

    /// The connection string, if one is set and non-blank
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Path of the file backend's record file
    pub fn vault_path(&self) -> PathBuf {
        self.data_dir.join(Self::VAULT_FILENAME)
    }

    /// Path the text export is written to
    pub fn export_path(&self) -> PathBuf {
        self.data_dir.join(Self::EXPORT_FILENAME)
    }

    /// Directory holding backup snapshots
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(Self::BACKUP_DIR)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all local files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the MongoDB connection string
    pub fn connection_string(mut self, uri: impl Into<String>) -> Self {
        self.config.connection_string = Some(uri.into());
        self
    }

    /// Set the connection string only if one was provided
    pub fn maybe_connection_string(mut self, uri: Option<String>) -> Self {
        self.config.connection_string = uri;
        self
    }

    /// Set the database name
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.config.database_name = Some(name.into());
        self
    }

    /// Set the database name only if one was provided
    pub fn maybe_database_name(mut self, name: Option<String>) -> Self {
        self.config.database_name = name;
        self
    }

    /// Set the collection name
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the per-subscriber event buffer
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
