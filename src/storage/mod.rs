//! Storage abstraction layer
//!
//! Key/blob interface the persistent registration store writes through.
//! Keys are `/`-separated relative paths.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

pub mod local;

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read object from storage
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Write object to storage, replacing any previous content atomically
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Delete object from storage (missing objects are not an error)
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if object exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// List object keys directly under `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
