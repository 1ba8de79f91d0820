//! Key-value persistence backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pagepilot_protocol::{KeyValueStore, StoreError};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: tokio::sync::RwLock<HashMap<String, Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON file per key.
///
/// ```text
/// {storage_path}/
/// ├── projects.json
/// ├── project_{uuid}.json
/// └── ...
/// ```
///
/// Writes go to a temp file that is renamed over the target, so a crash
/// leaves either the old or the new value, never a torn file.
pub struct FileKvStore {
    storage_path: PathBuf,
}

impl FileKvStore {
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(&storage_path).await?;
        debug!("FileKvStore initialized at {:?}", storage_path);
        Ok(Self { storage_path })
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key".to_string()));
        }
        Ok(self.storage_path.join(format!("{}.json", Self::sanitize_key(key))))
    }

    /// Map a key onto a safe file stem.
    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.key_path(key)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("Failed to parse {:?}: {}", path, e))
        })?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(&value)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        debug!("Stored key '{}' at {:?}", key, path);
        Ok(())
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
