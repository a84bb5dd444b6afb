//! Append-only snapshot store.
//!
//! Every save publishes a new record at `snapshots/<projectId>/<key>.json`
//! using the provider's create-only write, so a record is either absent or
//! complete and is never rewritten.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use tracing::{debug, info, warn};

use pagevault_core::error::{AppError, ErrorKind};
use pagevault_core::result::AppResult;
use pagevault_core::traits::snapshot::SnapshotSink;
use pagevault_core::traits::storage::StorageProvider;
use pagevault_core::types::{Document, OrderingKey, ProjectId};

use crate::codec::BlobCodec;

use super::key::KeyGenerator;

/// Top-level directory for snapshot records.
const SNAPSHOT_ROOT: &str = "snapshots";
/// File extension of a snapshot record.
const SNAPSHOT_EXT: &str = ".json";
/// How many fresh keys a save tries before giving up on collisions.
const MAX_PUBLISH_ATTEMPTS: usize = 8;

/// One stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Ordering key the snapshot was published under.
    pub key: OrderingKey,
    /// The decoded document.
    pub document: Document,
}

/// Saves, lists and loads whole-document snapshots.
#[derive(Debug)]
pub struct SnapshotStore {
    provider: Arc<dyn StorageProvider>,
    codec: BlobCodec,
    keys: KeyGenerator,
    /// Projects whose key cursor has been seeded from persisted records.
    seeded: DashSet<ProjectId>,
}

impl SnapshotStore {
    /// Create a snapshot store over `provider`.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            codec: BlobCodec::new(),
            keys: KeyGenerator::new(),
            seeded: DashSet::new(),
        }
    }

    /// Encode and publish `document` as the newest snapshot of `project_id`.
    pub async fn save(&self, project_id: &ProjectId, document: &Document) -> AppResult<OrderingKey> {
        let payload = self.codec.encode(document)?;
        self.ensure_seeded(project_id).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Cannot save snapshot of '{project_id}': existing keys are unreadable"),
                e,
            )
        })?;

        for attempt in 1..=MAX_PUBLISH_ATTEMPTS {
            let key = self.keys.next(project_id)?;
            let path = record_path(project_id, &key);

            match self.provider.write_new(&path, payload.clone()).await {
                Ok(()) => {
                    info!(
                        project_id = %project_id,
                        ordering_key = %key,
                        bytes = payload.len(),
                        "Snapshot saved"
                    );
                    return Ok(key);
                }
                // Another writer owns this key; the cursor already sits on
                // it, so the next key issued is strictly greater.
                Err(e) if e.is_conflict() => {
                    warn!(
                        project_id = %project_id,
                        ordering_key = %key,
                        attempt,
                        "Snapshot key already taken, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::storage_write(format!(
            "Could not publish snapshot of '{project_id}' after {MAX_PUBLISH_ATTEMPTS} attempts"
        )))
    }

    /// Newest readable snapshot, or `None` if the project has none.
    pub async fn load_latest(&self, project_id: &ProjectId) -> AppResult<Option<Snapshot>> {
        for key in self.list(project_id).await? {
            match self.provider.read_bytes(&record_path(project_id, &key)).await {
                Ok(bytes) => {
                    let document = self.codec.decode(&bytes)?;
                    debug!(project_id = %project_id, ordering_key = %key, "Loaded latest snapshot");
                    return Ok(Some(Snapshot { key, document }));
                }
                // Removed between listing and reading; fall back to the next one.
                Err(e) if e.is_not_found() => {
                    debug!(project_id = %project_id, ordering_key = %key, "Listed snapshot vanished");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Load the snapshot published under `key`.
    pub async fn load(&self, project_id: &ProjectId, key: &OrderingKey) -> AppResult<Snapshot> {
        let bytes = self
            .provider
            .read_bytes(&record_path(project_id, key))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AppError::not_found(format!("Snapshot {key} of '{project_id}' not found"))
                } else {
                    e
                }
            })?;

        Ok(Snapshot {
            key: *key,
            document: self.codec.decode(&bytes)?,
        })
    }

    /// All snapshot keys of `project_id`, newest first.
    ///
    /// Files that do not parse as ordering keys are ignored.
    pub async fn list(&self, project_id: &ProjectId) -> AppResult<Vec<OrderingKey>> {
        let entries = self.provider.list(&project_dir(project_id)).await?;

        let mut keys: Vec<OrderingKey> = entries
            .iter()
            .filter(|entry| !entry.is_directory)
            .filter_map(|entry| {
                let file_name = entry.path.rsplit('/').next()?;
                let stem = file_name.strip_suffix(SNAPSHOT_EXT)?;
                match stem.parse::<OrderingKey>() {
                    Ok(key) => Some(key),
                    Err(_) => {
                        debug!(path = %entry.path, "Skipping foreign file in snapshot directory");
                        None
                    }
                }
            })
            .collect();

        keys.sort_unstable_by(|a, b| b.cmp(a));
        Ok(keys)
    }

    /// One page of keys strictly older than `before` (or from the newest if
    /// `None`), newest first.
    ///
    /// Passing the last key of a page as `before` yields the next page, and
    /// keys published meanwhile never shift pages already handed out.
    pub async fn list_before(
        &self,
        project_id: &ProjectId,
        before: Option<&OrderingKey>,
        limit: usize,
    ) -> AppResult<Vec<OrderingKey>> {
        let keys = self.list(project_id).await?;
        Ok(keys
            .into_iter()
            .filter(|key| before.is_none_or(|cursor| key < cursor))
            .take(limit)
            .collect())
    }

    /// Make sure keys issued for `project_id` sort after every persisted
    /// record, including ones written before this process started.
    async fn ensure_seeded(&self, project_id: &ProjectId) -> AppResult<()> {
        if self.seeded.contains(project_id) {
            return Ok(());
        }

        let existing = self.list(project_id).await?;
        if let Some(newest) = existing.first() {
            self.keys.observe(project_id, *newest);
            debug!(project_id = %project_id, ordering_key = %newest, "Seeded key cursor");
        }
        self.seeded.insert(project_id.clone());
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for SnapshotStore {
    async fn save(&self, project_id: &ProjectId, document: Document) -> AppResult<OrderingKey> {
        SnapshotStore::save(self, project_id, &document).await
    }
}

fn project_dir(project_id: &ProjectId) -> String {
    format!("{SNAPSHOT_ROOT}/{}", project_id.as_str())
}

fn record_path(project_id: &ProjectId, key: &OrderingKey) -> String {
    format!("{SNAPSHOT_ROOT}/{}/{key}{SNAPSHOT_EXT}", project_id.as_str())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    use bytes::Bytes;
    use futures::future::join_all;
    use serde_json::json;

    use pagevault_storage::providers::{LocalStorageProvider, MemoryStorageProvider};

    use crate::test_support::FaultyProvider;

    use super::*;

    fn project() -> ProjectId {
        "default".parse().unwrap()
    }

    fn memory_store() -> (Arc<MemoryStorageProvider>, SnapshotStore) {
        let provider = Arc::new(MemoryStorageProvider::new());
        let store = SnapshotStore::new(provider.clone());
        (provider, store)
    }

    #[tokio::test]
    async fn test_latest_wins() {
        let (_provider, store) = memory_store();

        store
            .save(&project(), &Document::new(json!({"pages": ["A"]})))
            .await
            .unwrap();
        store
            .save(&project(), &Document::new(json!({"pages": ["A", "B"]})))
            .await
            .unwrap();

        let latest = store.load_latest(&project()).await.unwrap().unwrap();
        assert_eq!(latest.document, Document::new(json!({"pages": ["A", "B"]})));
    }

    #[tokio::test]
    async fn test_empty_project_has_no_latest() {
        let (_provider, store) = memory_store();
        assert!(store.load_latest(&project()).await.unwrap().is_none());
        assert!(store.list(&project()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_ordered_keys() {
        let (_provider, store) = memory_store();
        let store = Arc::new(store);

        let saves = (0..32).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .save(&project(), &Document::new(json!({ "n": i })))
                    .await
                    .unwrap()
            })
        });
        let keys: Vec<OrderingKey> = join_all(saves)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let distinct: HashSet<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(distinct.len(), 32);

        let listed = store.list(&project()).await.unwrap();
        assert_eq!(listed.len(), 32);
        assert!(listed.windows(2).all(|pair| pair[0] > pair[1]));
        // Lexical order of the string form matches key order.
        assert!(
            listed
                .windows(2)
                .all(|pair| pair[0].to_string() > pair[1].to_string())
        );
    }

    #[tokio::test]
    async fn test_rejected_document_writes_nothing() {
        let (provider, store) = memory_store();
        let err = store
            .save(&project(), &Document::new(json!([1, 2, 3])))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Encoding);
        assert!(provider.is_empty());
    }

    #[tokio::test]
    async fn test_new_store_continues_after_persisted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap().to_string();

        let first = SnapshotStore::new(Arc::new(LocalStorageProvider::new(&root).await.unwrap()));
        let mut last = None;
        for i in 0..3 {
            last = Some(
                first
                    .save(&project(), &Document::new(json!({ "rev": i })))
                    .await
                    .unwrap(),
            );
        }

        // A restarted process must not issue keys older than what is on disk.
        let second = SnapshotStore::new(Arc::new(LocalStorageProvider::new(&root).await.unwrap()));
        let next = second
            .save(&project(), &Document::new(json!({ "rev": 3 })))
            .await
            .unwrap();
        assert!(Some(next) > last);

        let latest = second.load_latest(&project()).await.unwrap().unwrap();
        assert_eq!(latest.key, next);
        assert_eq!(latest.document.as_value()["rev"], 3);
    }

    #[tokio::test]
    async fn test_save_retries_past_foreign_record() {
        let (provider, store) = memory_store();
        let first = store.save(&project(), &Document::empty()).await.unwrap();

        // Simulate another writer grabbing the very next key.
        let taken = OrderingKey::from_millis(first.millis(), first.sequence() + 1).unwrap();
        provider
            .write_new(&record_path(&project(), &taken), Bytes::from_static(b"{}"))
            .await
            .unwrap();

        let key = store.save(&project(), &Document::empty()).await.unwrap();
        assert_ne!(key, taken);
        assert!(key > first);
    }

    #[tokio::test]
    async fn test_list_before_pages_stably() {
        let (_provider, store) = memory_store();
        for i in 0..5 {
            store
                .save(&project(), &Document::new(json!({ "rev": i })))
                .await
                .unwrap();
        }

        let first_page = store.list_before(&project(), None, 2).await.unwrap();
        assert_eq!(first_page.len(), 2);

        // A save between pages must not disturb the next page.
        store.save(&project(), &Document::empty()).await.unwrap();

        let second_page = store
            .list_before(&project(), first_page.last(), 2)
            .await
            .unwrap();
        let third_page = store
            .list_before(&project(), second_page.last(), 2)
            .await
            .unwrap();

        assert_eq!(second_page.len(), 2);
        assert_eq!(third_page.len(), 1);
        assert!(first_page.last() > second_page.first());
        assert!(second_page.last() > third_page.first());
    }

    #[tokio::test]
    async fn test_load_specific_snapshot() {
        let (_provider, store) = memory_store();
        let key = store
            .save(&project(), &Document::new(json!({"pages": ["A"]})))
            .await
            .unwrap();
        store.save(&project(), &Document::empty()).await.unwrap();

        let snapshot = store.load(&project(), &key).await.unwrap();
        assert_eq!(snapshot.document, Document::new(json!({"pages": ["A"]})));

        let missing = OrderingKey::from_millis(0, 0).unwrap();
        assert!(store.load(&project(), &missing).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_latest_is_a_decoding_error() {
        let (provider, store) = memory_store();
        store.save(&project(), &Document::empty()).await.unwrap();
        let bad = OrderingKey::from_millis(chrono::Utc::now().timestamp_millis() + 60_000, 0)
            .unwrap();
        provider
            .write_new(&record_path(&project(), &bad), Bytes::from_static(b"garbage"))
            .await
            .unwrap();

        let err = store.load_latest(&project()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decoding);
    }

    #[tokio::test]
    async fn test_foreign_files_are_ignored() {
        let (provider, store) = memory_store();
        provider
            .write("snapshots/default/notes.txt", Bytes::from_static(b"hi"))
            .await
            .unwrap();
        store.save(&project(), &Document::empty()).await.unwrap();
        assert_eq!(store.list(&project()).await.unwrap().len(), 1);
    }

    fn faulty_store() -> (Arc<FaultyProvider>, SnapshotStore) {
        let provider = Arc::new(FaultyProvider::default());
        let store = SnapshotStore::new(provider.clone());
        (provider, store)
    }

    #[tokio::test]
    async fn test_latest_falls_back_when_newest_vanished() {
        let (provider, store) = faulty_store();
        let older = store
            .save(&project(), &Document::new(json!({"pages": ["A"]})))
            .await
            .unwrap();
        let newer = store
            .save(&project(), &Document::new(json!({"pages": ["A", "B"]})))
            .await
            .unwrap();

        provider.vanish(record_path(&project(), &newer));

        let latest = store.load_latest(&project()).await.unwrap().unwrap();
        assert_eq!(latest.key, older);
        assert_eq!(latest.document, Document::new(json!({"pages": ["A"]})));
    }

    #[tokio::test]
    async fn test_latest_is_none_when_every_record_vanished() {
        let (provider, store) = faulty_store();
        let key = store.save(&project(), &Document::empty()).await.unwrap();
        provider.vanish(record_path(&project(), &key));

        assert!(store.load_latest(&project()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced_and_leaves_nothing() {
        let (provider, store) = faulty_store();
        provider.fail_writes_ending_with(SNAPSHOT_EXT);

        let err = store
            .save(&project(), &Document::new(json!({"pages": ["A"]})))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::StorageWrite);
        assert!(err.message.contains("Disk full"));
        assert_eq!(provider.write_new_calls.load(Ordering::SeqCst), 1);
        assert!(store.list(&project()).await.unwrap().is_empty());
        assert!(store.load_latest(&project()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_gives_up_after_bounded_collisions() {
        let (provider, store) = faulty_store();
        provider.always_conflict();

        let err = store.save(&project(), &Document::empty()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::StorageWrite);
        assert!(err.message.contains(&format!("{MAX_PUBLISH_ATTEMPTS} attempts")));
        assert_eq!(
            provider.write_new_calls.load(Ordering::SeqCst),
            MAX_PUBLISH_ATTEMPTS
        );
        assert!(provider.inner.is_empty());
    }
}
