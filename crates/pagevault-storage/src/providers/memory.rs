//! In-process storage provider backed by a concurrent map.
//!
//! Useful for tests and ephemeral deployments; contents vanish with the
//! process.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use pagevault_core::error::AppError;
use pagevault_core::result::AppResult;
use pagevault_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified: DateTime<Utc>,
}

/// In-memory storage provider.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider {
    /// Normalized path → object.
    objects: Arc<DashMap<String, StoredObject>>,
}

impl MemoryStorageProvider {
    /// Create an empty in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the provider holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let data = self.read_bytes(path).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.objects
            .get(&normalize(path))
            .map(|object| object.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {path}")))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let bytes = data.len();
        self.objects.insert(
            normalize(path),
            StoredObject {
                data,
                modified: Utc::now(),
            },
        );
        debug!(path, bytes, "Wrote object");
        Ok(())
    }

    async fn write_new(&self, path: &str, data: Bytes) -> AppResult<()> {
        match self.objects.entry(normalize(path)) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Object already exists: {path}"
            ))),
            Entry::Vacant(slot) => {
                let bytes = data.len();
                slot.insert(StoredObject {
                    data,
                    modified: Utc::now(),
                });
                debug!(path, bytes, "Published new object");
                Ok(())
            }
        }
    }

    async fn delete(&self, path: &str) -> AppResult<bool> {
        Ok(self.objects.remove(&normalize(path)).is_some())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.objects.contains_key(&normalize(path)))
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        let dir = normalize(path);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        // BTreeMap keeps output sorted and collapses nested keys into one
        // directory entry.
        let mut children: BTreeMap<String, StorageObjectMeta> = BTreeMap::new();
        for entry in self.objects.iter() {
            let Some(rest) = entry.key().strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    let child_path = format!("{prefix}{child}");
                    children
                        .entry(child_path.clone())
                        .or_insert(StorageObjectMeta {
                            path: child_path,
                            size_bytes: 0,
                            last_modified: None,
                            is_directory: true,
                        });
                }
                None => {
                    children.insert(
                        entry.key().clone(),
                        StorageObjectMeta {
                            path: entry.key().clone(),
                            size_bytes: entry.data.len() as u64,
                            last_modified: Some(entry.modified),
                            is_directory: false,
                        },
                    );
                }
            }
        }

        let mut entries: Vec<StorageObjectMeta> = children.into_values().collect();
        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.path.cmp(&b.path))
        });
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use pagevault_core::error::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_write_new_conflicts() {
        let provider = MemoryStorageProvider::new();
        provider.write_new("a/b", Bytes::from("1")).await.unwrap();
        let err = provider.write_new("/a/b", Bytes::from("2")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(provider.read_bytes("a/b").await.unwrap(), Bytes::from("1"));
    }

    #[tokio::test]
    async fn test_list_direct_children_only() {
        let provider = MemoryStorageProvider::new();
        provider.write("root/x.json", Bytes::from("x")).await.unwrap();
        provider.write("root/y.json", Bytes::from("yy")).await.unwrap();
        provider.write("root/nested/z.json", Bytes::from("z")).await.unwrap();
        provider.write("rootless.json", Bytes::from("r")).await.unwrap();

        let entries = provider.list("root").await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["root/nested", "root/x.json", "root/y.json"]);
        assert_eq!(entries[2].size_bytes, 2);
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let provider = MemoryStorageProvider::new();
        provider.write("k", Bytes::from("v")).await.unwrap();
        assert!(provider.delete("k").await.unwrap());
        assert!(!provider.delete("k").await.unwrap());
        assert!(provider.is_empty());
    }
}
