//! Tests for FileStore
//!
//! These tests verify:
//! - Missing and empty files read as an empty collection
//! - Atomic replace of the whole collection
//! - CRUD through the RecordStore contract
//! - Legacy records are healed on read and persisted once
//! - Last-modified reporting

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use recordvault::record::Record;
use recordvault::storage::{FileStore, RecordStore, SortSpec};
use recordvault::VaultError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, FileStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("vault.json"));
    (temp_dir, store)
}

fn record(id: i64, name: &str, value: &str) -> Record {
    Record::new(id, name, value, Utc.timestamp_millis_opt(id).unwrap())
}

fn vault_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("vault.json")
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[tokio::test]
async fn test_read_all_missing_file_is_empty() {
    let (_temp, store) = setup_temp_store();

    let records = store.read_all().await.unwrap();

    assert!(records.is_empty());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_read_all_blank_file_is_empty() {
    let (temp, store) = setup_temp_store();
    std::fs::write(vault_path(&temp), "  \n").unwrap();

    assert!(store.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_all_then_read_all_preserves_order() {
    let (_temp, store) = setup_temp_store();
    let records = vec![record(3, "c", "3"), record(1, "a", "1"), record(2, "b", "2")];

    store.write_all(&records).await.unwrap();

    assert_eq!(store.read_all().await.unwrap(), records);
}

#[tokio::test]
async fn test_write_all_replaces_content_and_leaves_no_temp_file() {
    let (temp, store) = setup_temp_store();

    store.write_all(&[record(1, "a", "1"), record(2, "b", "2")]).await.unwrap();
    store.write_all(&[record(3, "c", "3")]).await.unwrap();

    let records = store.read_all().await.unwrap();
    assert_eq!(records, vec![record(3, "c", "3")]);

    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name != "vault.json")
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
}

#[tokio::test]
async fn test_write_all_creates_parent_directory() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("nested").join("vault.json"));

    store.write_all(&[record(1, "a", "1")]).await.unwrap();

    assert!(temp.path().join("nested").join("vault.json").exists());
}

#[tokio::test]
async fn test_corrupt_file_is_serialization_error() {
    let (temp, store) = setup_temp_store();
    std::fs::write(vault_path(&temp), "{not json").unwrap();

    let result = store.list().await;

    assert!(matches!(result, Err(VaultError::Serialization(_))));
}

// =============================================================================
// RecordStore Contract Tests
// =============================================================================

#[tokio::test]
async fn test_add_then_list() {
    let (_temp, store) = setup_temp_store();

    store.add(record(1, "wifi", "secret1")).await.unwrap();
    store.add(record(2, "email", "secret2")).await.unwrap();

    let records = store.list().await.unwrap();
    assert_eq!(records, vec![record(1, "wifi", "secret1"), record(2, "email", "secret2")]);
}

#[tokio::test]
async fn test_add_duplicate_id_is_rejected() {
    let (_temp, store) = setup_temp_store();
    store.add(record(1, "wifi", "secret1")).await.unwrap();

    let result = store.add(record(1, "other", "value")).await;

    assert!(matches!(result, Err(VaultError::DuplicateId(1))));
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_replaces_name_and_value_only() {
    let (_temp, store) = setup_temp_store();
    let original = record(7, "wifi", "secret1");
    store.add(original.clone()).await.unwrap();

    let updated = store.update(7, "router", "hunter2").await.unwrap().unwrap();

    assert_eq!(updated.id, 7);
    assert_eq!(updated.name, "router");
    assert_eq!(updated.value, "hunter2");
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(store.list().await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn test_update_missing_id_returns_none_and_does_not_write() {
    let (_temp, store) = setup_temp_store();

    let result = store.update(99, "x", "y").await.unwrap();

    assert_eq!(result, None);
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_get_finds_record_by_id() {
    let (_temp, store) = setup_temp_store();
    store.add(record(1, "wifi", "secret1")).await.unwrap();

    assert_eq!(store.get(1).await.unwrap(), Some(record(1, "wifi", "secret1")));
    assert_eq!(store.get(2).await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_removes_and_returns_record() {
    let (_temp, store) = setup_temp_store();
    store.add(record(1, "a", "1")).await.unwrap();
    store.add(record(2, "b", "2")).await.unwrap();

    let removed = store.delete(1).await.unwrap();

    assert_eq!(removed, Some(record(1, "a", "1")));
    assert_eq!(store.list().await.unwrap(), vec![record(2, "b", "2")]);
    assert_eq!(store.delete(1).await.unwrap(), None);
}

#[tokio::test]
async fn test_search_and_sort_go_through_file() {
    let (_temp, store) = setup_temp_store();
    store.add(record(2, "wifi", "secret1")).await.unwrap();
    store.add(record(1, "email", "secret2")).await.unwrap();

    let found = store.search("WIFI").await.unwrap();
    assert_eq!(found, vec![record(2, "wifi", "secret1")]);

    let sorted = store.sort(SortSpec::parse("id", "asc").unwrap()).await.unwrap();
    assert_eq!(sorted.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

    // Stored order is untouched
    let stored = store.list().await.unwrap();
    assert_eq!(stored.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
}

#[tokio::test]
async fn test_source_name_is_file_name() {
    let (_temp, store) = setup_temp_store();
    assert_eq!(store.source_name(), "vault.json");
}

// =============================================================================
// Backfill Tests
// =============================================================================

#[tokio::test]
async fn test_list_backfills_missing_created_at_and_persists() {
    let (temp, store) = setup_temp_store();
    std::fs::write(
        vault_path(&temp),
        r#"[{"id": 1714558830123, "name": "wifi", "value": "secret1"}]"#,
    )
    .unwrap();

    let records = store.list().await.unwrap();

    assert_eq!(records[0].created_at, "2024-05-01T10:20:30.123Z");

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(vault_path(&temp)).unwrap()).unwrap();
    assert_eq!(on_disk[0]["createdAt"], "2024-05-01T10:20:30.123Z");
}

#[tokio::test]
async fn test_read_all_backfills_without_persisting() {
    let (temp, store) = setup_temp_store();
    let legacy = r#"[{"id": 1714558830123, "name": "wifi", "value": "secret1"}]"#;
    std::fs::write(vault_path(&temp), legacy).unwrap();

    let records = store.read_all().await.unwrap();

    assert_eq!(records[0].created_at, "2024-05-01T10:20:30.123Z");
    assert_eq!(std::fs::read_to_string(vault_path(&temp)).unwrap(), legacy);
}

#[tokio::test]
async fn test_list_coerces_scalar_values_and_ids() {
    let (temp, store) = setup_temp_store();
    std::fs::write(
        vault_path(&temp),
        r#"[
            {"id": "5", "name": "pin", "value": 1234, "createdAt": "2024-05-01T10:20:30.123Z"},
            {"id": 6.0, "name": "flag", "value": true, "createdAt": "2024-05-01T10:20:30.123Z"}
        ]"#,
    )
    .unwrap();

    let records = store.list().await.unwrap();

    assert_eq!(records[0].id, 5);
    assert_eq!(records[0].value, "1234");
    assert_eq!(records[1].id, 6);
    assert_eq!(records[1].value, "true");

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(vault_path(&temp)).unwrap()).unwrap();
    assert_eq!(on_disk[0]["id"], 5);
    assert_eq!(on_disk[0]["value"], "1234");
}

#[tokio::test]
async fn test_list_heals_record_without_usable_id() {
    let (temp, store) = setup_temp_store();
    std::fs::write(
        vault_path(&temp),
        r#"[
            {"id": "legacy-1", "name": "old", "value": "v"},
            {"id": 1700000000000, "name": "wifi", "value": "secret1", "createdAt": "2023-11-14T22:13:20.000Z"},
            {"name": "no-id", "value": "w"}
        ]"#,
    )
    .unwrap();
    let before = Utc::now();

    let records = store.list().await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].id, 1700000000000);
    assert_eq!(records[0].name, "old");
    assert!(records[0].id > 1700000000000);
    assert!(records[2].id > 1700000000000);
    assert_ne!(records[0].id, records[2].id);
    assert!(records[0].created_at_time().unwrap() >= before - chrono::Duration::seconds(1));

    // The healed ids are persisted, so later reads agree
    let again = store.list().await.unwrap();
    assert_eq!(again, records);
}

#[tokio::test]
async fn test_store_stays_usable_after_healing_id() {
    let (temp, store) = setup_temp_store();
    std::fs::write(vault_path(&temp), r#"[{"id": "legacy-1", "name": "old", "value": "v"}]"#).unwrap();

    store.add(record(1714558830123, "wifi", "secret1")).await.unwrap();
    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 2);

    let healed_id = records[0].id;
    assert!(store.delete(healed_id).await.unwrap().is_some());
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_does_not_rewrite_canonical_file() {
    let (temp, store) = setup_temp_store();
    store.write_all(&[record(1, "a", "1")]).await.unwrap();
    let before = std::fs::metadata(vault_path(&temp)).unwrap().modified().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    store.list().await.unwrap();

    let after = std::fs::metadata(vault_path(&temp)).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

// =============================================================================
// Last-Modified Tests
// =============================================================================

#[tokio::test]
async fn test_last_modified_missing_file_is_none() {
    let (_temp, store) = setup_temp_store();
    assert_eq!(store.last_modified().await.unwrap(), None);
}

#[tokio::test]
async fn test_last_modified_after_write_is_recent() {
    let (_temp, store) = setup_temp_store();
    store.write_all(&[record(1, "a", "1")]).await.unwrap();

    let modified = store.last_modified().await.unwrap().unwrap();

    let age = Utc::now() - modified;
    assert!(age.num_seconds() < 60);
}
