//! Asset upload, delete and serving handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use validator::Validate;

use pagevault_core::error::AppError;
use pagevault_core::types::AssetId;
use pagevault_service::asset::{AssetUpload, DeleteOutcome};

use crate::dto::request::DeleteAssetsRequest;
use crate::dto::response::{
    DataResponse, DeleteItemResponse, DeleteStatus, UploadItemResponse, UploadStatus,
};
use crate::error::ApiError;
use crate::router::MAX_ASSETS_PER_REQUEST;
use crate::state::AppState;

/// URL an asset is served from; embedded by the editor into documents.
pub fn asset_src(asset_id: &AssetId) -> String {
    format!("/api/assets/{asset_id}")
}

/// POST /api/save-assets: multipart, one part per file.
///
/// Parts without a file name are ignored. Each file is stored independently
/// and reported in request order.
pub async fn save_assets(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DataResponse<Vec<UploadItemResponse>>>, ApiError> {
    let mut multipart = multipart?;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.file_name().map(String::from) else {
            tracing::debug!(field = ?field.name(), "Skipping multipart field without file name");
            continue;
        };
        if uploads.len() == MAX_ASSETS_PER_REQUEST {
            return Err(AppError::validation(format!(
                "At most {MAX_ASSETS_PER_REQUEST} files per request"
            ))
            .into());
        }
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!(name = %name, error = %e, "Failed to read multipart part");
            ApiError::from(e)
        })?;

        uploads.push(AssetUpload::new(name, bytes, content_type));
    }

    if uploads.is_empty() {
        return Err(AppError::validation("Request contains no files").into());
    }

    let names: Vec<String> = uploads.iter().map(|u| u.name.clone()).collect();
    let results = state.assets.upload_many(&state.project_id, uploads).await;

    let items = names
        .into_iter()
        .zip(results)
        .map(|(name, result)| match result {
            Ok(meta) => UploadItemResponse {
                name: meta.name,
                status: UploadStatus::Uploaded,
                asset_id: Some(meta.asset_id.to_string()),
                src: Some(asset_src(&meta.asset_id)),
                content_type: Some(meta.content_type),
                size_bytes: Some(meta.size_bytes),
                error: None,
            },
            Err(e) => UploadItemResponse {
                name,
                status: UploadStatus::Error,
                asset_id: None,
                src: None,
                content_type: None,
                size_bytes: None,
                error: Some(e.message),
            },
        })
        .collect();

    Ok(Json(DataResponse::new(items)))
}

/// DELETE /api/delete-assets: body `{"assetIds": [...]}`.
pub async fn delete_assets(
    State(state): State<AppState>,
    request: Result<Json<DeleteAssetsRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Vec<DeleteItemResponse>>>, ApiError> {
    let Json(request) = request?;
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let parsed: Vec<Option<AssetId>> = request
        .asset_ids
        .iter()
        .map(|raw| raw.parse::<AssetId>().ok())
        .collect();
    let valid: Vec<AssetId> = parsed.iter().flatten().copied().collect();
    let mut outcomes = state
        .assets
        .delete_many(&state.project_id, &valid)
        .await
        .into_iter();

    let items = request
        .asset_ids
        .into_iter()
        .zip(parsed)
        .map(|(asset_id, id)| {
            let outcome = id.and_then(|_| outcomes.next());
            let (status, error) = match outcome {
                None => (DeleteStatus::Invalid, Some("Not a valid asset id".to_string())),
                Some(Ok(DeleteOutcome::Deleted)) => (DeleteStatus::Deleted, None),
                Some(Ok(DeleteOutcome::NotFound)) => (DeleteStatus::NotFound, None),
                Some(Err(e)) => (DeleteStatus::Error, Some(e.message)),
            };
            DeleteItemResponse {
                asset_id,
                status,
                error,
            }
        })
        .collect();

    Ok(Json(DataResponse::new(items)))
}

/// GET /api/assets/{asset_id}: stream the stored bytes.
pub async fn get_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Response, ApiError> {
    let asset_id: AssetId = asset_id
        .parse()
        .map_err(|_| AppError::not_found(format!("Asset {asset_id} not found")))?;

    let (meta, stream) = state.assets.open(&state.project_id, &asset_id).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, meta.content_type)
        .header(header::CONTENT_LENGTH, meta.size_bytes)
        // Ids are never reused, so the bytes behind a URL never change.
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
