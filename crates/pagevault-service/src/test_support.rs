//! Storage double that injects failures into an in-memory provider.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use pagevault_core::error::AppError;
use pagevault_core::result::AppResult;
use pagevault_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};
use pagevault_storage::providers::MemoryStorageProvider;

#[derive(Debug, Default)]
pub struct FaultyProvider {
    pub inner: MemoryStorageProvider,
    /// Paths that still list but read as missing.
    vanished: Mutex<HashSet<String>>,
    /// Create-only writes to paths ending with this suffix fail.
    fail_writes_ending_with: Mutex<Option<String>>,
    /// Every create-only write reports the target as taken.
    always_conflict: AtomicBool,
    pub write_new_calls: AtomicUsize,
}

impl FaultyProvider {
    pub fn vanish(&self, path: impl Into<String>) {
        self.vanished.lock().unwrap().insert(path.into());
    }

    pub fn fail_writes_ending_with(&self, suffix: &str) {
        *self.fail_writes_ending_with.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn always_conflict(&self) {
        self.always_conflict.store(true, Ordering::SeqCst);
    }

    fn is_vanished(&self, path: &str) -> bool {
        self.vanished.lock().unwrap().contains(path)
    }
}

#[async_trait]
impl StorageProvider for FaultyProvider {
    fn provider_type(&self) -> &str {
        "faulty"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        if self.is_vanished(path) {
            return Err(AppError::not_found(format!("Object not found: {path}")));
        }
        self.inner.read(path).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        if self.is_vanished(path) {
            return Err(AppError::not_found(format!("Object not found: {path}")));
        }
        self.inner.read_bytes(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(path, data).await
    }

    async fn write_new(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.write_new_calls.fetch_add(1, Ordering::SeqCst);
        if self.always_conflict.load(Ordering::SeqCst) {
            return Err(AppError::conflict(format!("Object already exists: {path}")));
        }
        let failing = self.fail_writes_ending_with.lock().unwrap().clone();
        if failing.is_some_and(|suffix| path.ends_with(&suffix)) {
            return Err(AppError::storage_write(format!("Disk full writing {path}")));
        }
        self.inner.write_new(path, data).await
    }

    async fn delete(&self, path: &str) -> AppResult<bool> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        self.inner.list(path).await
    }
}
