use super::*;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_memory_store_roundtrip() {
    let store = MemoryKvStore::new();
    assert!(store.get("projects").await.unwrap().is_none());

    store.set("projects", json!(["p1"])).await.unwrap();
    assert_eq!(store.get("projects").await.unwrap(), Some(json!(["p1"])));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_file_store_set_and_get() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKvStore::new(temp_dir.path()).await.unwrap();

    store
        .set("project:abc", json!({"project": {"name": "Research"}}))
        .await
        .unwrap();

    let loaded = store.get("project:abc").await.unwrap().unwrap();
    assert_eq!(loaded["project"]["name"], "Research");
    assert!(temp_dir.path().join("project_abc.json").exists());
}

#[tokio::test]
async fn test_file_store_overwrite_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKvStore::new(temp_dir.path()).await.unwrap();

    store.set("projects", json!(["a"])).await.unwrap();
    store.set("projects", json!(["a", "b"])).await.unwrap();

    assert_eq!(store.get("projects").await.unwrap(), Some(json!(["a", "b"])));
    assert!(!temp_dir.path().join("projects.json.tmp").exists());
}

#[tokio::test]
async fn test_file_store_missing_key() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKvStore::new(temp_dir.path()).await.unwrap();
    assert!(store.get("project:none").await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = FileKvStore::new(temp_dir.path()).await.unwrap();
        store.set("projects", json!(["p1"])).await.unwrap();
    }
    let reopened = FileKvStore::new(temp_dir.path()).await.unwrap();
    assert_eq!(reopened.get("projects").await.unwrap(), Some(json!(["p1"])));
}

#[tokio::test]
async fn test_file_store_corrupt_file_is_serialization_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKvStore::new(temp_dir.path()).await.unwrap();
    std::fs::write(temp_dir.path().join("projects.json"), "{not json").unwrap();

    let err = store.get("projects").await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn test_empty_key_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKvStore::new(temp_dir.path()).await.unwrap();
    assert!(matches!(
        store.set("", json!(1)).await.unwrap_err(),
        StoreError::InvalidKey(_)
    ));
}

#[test]
fn test_sanitize_key() {
    assert_eq!(FileKvStore::sanitize_key("project:1234-ab"), "project_1234-ab");
    assert_eq!(FileKvStore::sanitize_key("../escape"), "___escape");
}
