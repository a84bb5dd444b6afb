//! Application builder: wires config, storage, stores and middleware into
//! an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use pagevault_core::config::AppConfig;
use pagevault_core::result::AppResult;
use pagevault_core::types::ProjectId;
use pagevault_service::asset::AssetStore;
use pagevault_service::codec::BlobCodec;
use pagevault_service::snapshot::SnapshotStore;
use pagevault_storage::manager::StorageManager;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the shared state from configuration.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    let project_id = ProjectId::new(config.project.id.clone())?;

    tracing::info!(provider = %config.storage.provider, "Initializing storage...");
    let storage_manager = Arc::new(StorageManager::new(&config.storage).await?);

    Ok(build_state_with(config, project_id, storage_manager))
}

/// Builds the shared state around an existing storage manager.
pub fn build_state_with(
    config: AppConfig,
    project_id: ProjectId,
    storage_manager: Arc<StorageManager>,
) -> AppState {
    let provider = storage_manager.provider();
    let snapshots = Arc::new(SnapshotStore::new(Arc::clone(&provider)));
    let assets = Arc::new(AssetStore::new(provider, config.server.max_asset_bytes));

    AppState {
        config: Arc::new(config),
        project_id,
        storage_manager,
        snapshots,
        assets,
        codec: BlobCodec::new(),
    }
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server = state.config.server.clone();

    build_router(state)
        .layer(build_compression_layer())
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(build_cors_layer(&server.cors))
        .layer(TraceLayer::new_for_http())
}
