//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use pagevault_core::config::AppConfig;
use pagevault_core::types::ProjectId;
use pagevault_service::asset::AssetStore;
use pagevault_service::codec::BlobCodec;
use pagevault_service::snapshot::SnapshotStore;
use pagevault_storage::manager::StorageManager;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// The implicit project every endpoint operates on
    pub project_id: ProjectId,

    // ── Infrastructure ───────────────────────────────────────
    /// Storage provider manager
    pub storage_manager: Arc<StorageManager>,

    // ── Stores ───────────────────────────────────────────────
    /// Append-only snapshot store
    pub snapshots: Arc<SnapshotStore>,
    /// Asset store
    pub assets: Arc<AssetStore>,
    /// Codec used to validate incoming documents
    pub codec: BlobCodec,
}
