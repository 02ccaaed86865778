//! Tests for DocumentStore that need no running server
//!
//! These tests verify:
//! - Operations without a connection string fail with a connection error
//! - The driver stays disconnected until first use
//! - Source naming for exports

use recordvault::storage::{DocumentStore, RecordStore};
use recordvault::{Config, VaultError};

#[tokio::test]
async fn test_ensure_connected_without_uri_fails() {
    let store = DocumentStore::new(None, None, "records");

    let result = store.ensure_connected().await;

    assert!(matches!(result, Err(VaultError::Connection(_))));
    assert!(!store.is_connected());
}

#[tokio::test]
async fn test_blank_uri_counts_as_missing() {
    let store = DocumentStore::new(Some("   ".to_string()), None, "records");

    let result = store.list().await;

    assert!(matches!(result, Err(VaultError::Connection(_))));
}

#[tokio::test]
async fn test_every_operation_requires_connection() {
    let store = DocumentStore::new(None, None, "records");

    assert!(matches!(store.get(1).await, Err(VaultError::Connection(_))));
    assert!(matches!(store.search("x").await, Err(VaultError::Connection(_))));
    assert!(matches!(store.update(1, "a", "b").await, Err(VaultError::Connection(_))));
    assert!(matches!(store.delete(1).await, Err(VaultError::Connection(_))));
}

#[tokio::test]
async fn test_last_modified_is_unavailable() {
    let store = DocumentStore::new(None, None, "records");
    assert_eq!(store.last_modified().await.unwrap(), None);
}

#[test]
fn test_source_name_uses_database_and_collection() {
    let config = Config::builder()
        .connection_string("mongodb://localhost:27017")
        .database_name("vault")
        .collection_name("entries")
        .build();

    let store = DocumentStore::from_config(&config);

    assert_eq!(store.source_name(), "mongodb:vault/entries");
    assert!(!store.is_connected());
}

#[tokio::test]
async fn test_database_name_comes_from_uri_when_not_configured() {
    let store = DocumentStore::new(
        Some("mongodb://localhost:27017/archive".to_string()),
        None,
        "records",
    );

    assert_eq!(store.resolve_database_name().await.unwrap(), "archive");
    assert!(!store.is_connected());
}

#[tokio::test]
async fn test_configured_database_name_wins_over_uri() {
    let store = DocumentStore::new(
        Some("mongodb://localhost:27017/archive".to_string()),
        Some("vault".to_string()),
        "records",
    );

    assert_eq!(store.resolve_database_name().await.unwrap(), "vault");
}

#[tokio::test]
async fn test_database_name_defaults_without_uri_database() {
    let store = DocumentStore::new(Some("mongodb://localhost:27017".to_string()), None, "records");

    assert_eq!(store.resolve_database_name().await.unwrap(), Config::DEFAULT_DATABASE);
}

#[tokio::test]
async fn test_resolve_database_name_without_uri_fails() {
    let store = DocumentStore::new(None, None, "records");

    let result = store.resolve_database_name().await;

    assert!(matches!(result, Err(VaultError::Connection(_))));
}
