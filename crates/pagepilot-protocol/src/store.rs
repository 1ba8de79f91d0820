//! Key-value persistence collaborator.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Minimal persistence capability consumed by the Coordinator.
///
/// Both operations must be atomic per key. Transport is up to the
/// implementation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
