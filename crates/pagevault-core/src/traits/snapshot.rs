//! The seam between the autosave policy and whatever persists snapshots.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{Document, OrderingKey, ProjectId};

/// Something that can durably save a whole document.
///
/// Implemented in-process by the snapshot store and remotely by the HTTP
/// client; the autosave coordinator only sees this trait.
#[async_trait]
pub trait SnapshotSink: Send + Sync + 'static {
    /// Persist `document` as a new snapshot of `project_id`.
    async fn save(&self, project_id: &ProjectId, document: Document) -> AppResult<OrderingKey>;
}
