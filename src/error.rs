//! Error types for RecordVault
//!
//! Provides a unified error type for all vault operations.
//! A missing record is never an error: lookups return `Ok(None)`.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for RecordVault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Duplicate record id: {0}")]
    DuplicateId(i64),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Remote Store Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VaultError {
    /// Shorthand for building a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        VaultError::Validation(message.into())
    }
}
