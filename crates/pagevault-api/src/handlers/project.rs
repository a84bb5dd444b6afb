//! Project document save/load and snapshot history handlers.

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use bytes::Bytes;

use pagevault_core::types::{Document, OrderingKey};

use crate::dto::response::{DataResponse, SaveProjectResponse};
use crate::error::ApiError;
use crate::extractors::SnapshotPageParams;
use crate::state::AppState;

/// POST /api/save-project: body is the whole editor document.
pub async fn save_project(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SaveProjectResponse>, ApiError> {
    let body = body?;
    let document = state.codec.decode_request_body(&body)?;
    let ordering_key = state.snapshots.save(&state.project_id, &document).await?;

    Ok(Json(SaveProjectResponse {
        message: "Project saved successfully".to_string(),
        ordering_key,
    }))
}

/// GET /api/load-project: latest document, or `{}` for a new project.
pub async fn load_project(State(state): State<AppState>) -> Result<Json<Document>, ApiError> {
    let document = match state.snapshots.load_latest(&state.project_id).await? {
        Some(snapshot) => snapshot.document,
        None => {
            tracing::debug!(project_id = %state.project_id, "No snapshot yet, serving empty project");
            Document::empty()
        }
    };
    Ok(Json(document))
}

/// GET /api/snapshots?before=...&limit=...: keys, newest first.
pub async fn list_snapshots(
    State(state): State<AppState>,
    Query(params): Query<SnapshotPageParams>,
) -> Result<Json<DataResponse<Vec<OrderingKey>>>, ApiError> {
    let (before, limit) = params.into_cursor()?;
    let keys = state
        .snapshots
        .list_before(&state.project_id, before.as_ref(), limit)
        .await?;
    Ok(Json(DataResponse::new(keys)))
}

/// GET /api/snapshots/{key}
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let key: OrderingKey = key.parse()?;
    let snapshot = state.snapshots.load(&state.project_id, &key).await?;
    Ok(Json(snapshot.document))
}
