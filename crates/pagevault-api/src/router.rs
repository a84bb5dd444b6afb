//! Route definitions for the PageVault HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Most files accepted in one `save-assets` request.
pub const MAX_ASSETS_PER_REQUEST: usize = 20;

/// Allowance for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let max_document = state.config.server.max_document_bytes;
    let max_assets = state
        .config
        .server
        .max_asset_bytes
        .saturating_mul(MAX_ASSETS_PER_REQUEST)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let api_routes = Router::new()
        .merge(project_routes(max_document))
        .merge(asset_routes(max_assets))
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Document save/load and snapshot history
fn project_routes(max_document: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/save-project",
            post(handlers::project::save_project).layer(DefaultBodyLimit::max(max_document)),
        )
        .route("/load-project", get(handlers::project::load_project))
        .route("/snapshots", get(handlers::project::list_snapshots))
        .route("/snapshots/{key}", get(handlers::project::get_snapshot))
}

/// Asset upload, delete, and serving
fn asset_routes(max_upload: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/save-assets",
            post(handlers::asset::save_assets).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/delete-assets", delete(handlers::asset::delete_assets))
        .route("/assets/{asset_id}", get(handlers::asset::get_asset))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
