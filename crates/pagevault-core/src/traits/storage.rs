//! Storage provider trait for pluggable durable media.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Path within the storage provider.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether this is a directory.
    pub is_directory: bool,
}

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for durable storage media.
///
/// Every write is atomic from a reader's point of view: an object is either
/// absent or complete, never partially written. Implementations exist for
/// the local filesystem and for process memory; both live in
/// `pagevault-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read an object and return its byte stream.
    ///
    /// Fails with `NotFound` when the object does not exist.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Read an object into memory.
    ///
    /// Fails with `NotFound` when the object does not exist.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Atomically write an object, replacing any previous content.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Atomically publish a new object.
    ///
    /// Fails with `Conflict` if an object already exists at `path`; the
    /// existing object is left untouched.
    async fn write_new(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Delete an object. Returns `false` if nothing existed at `path`.
    async fn delete(&self, path: &str) -> AppResult<bool>;

    /// Check whether an object exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// List the direct children of a directory / key prefix.
    ///
    /// A missing directory lists as empty.
    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>>;
}
