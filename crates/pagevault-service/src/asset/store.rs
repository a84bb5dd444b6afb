//! Asset store: upload, fetch and delete binary media.
//!
//! Each asset is two records under `assets/<projectId>/`: the blob at
//! `<assetId>` and its metadata at `<assetId>.meta.json`. The metadata is
//! published last and removed first, so an asset is visible exactly while
//! its metadata exists.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use pagevault_core::error::{AppError, ErrorKind};
use pagevault_core::result::AppResult;
use pagevault_core::traits::storage::{ByteStream, StorageProvider};
use pagevault_core::types::{AssetId, ProjectId};

use super::model::{Asset, AssetMeta, AssetUpload, DeleteOutcome};

/// Top-level directory for asset records.
const ASSET_ROOT: &str = "assets";
/// Suffix of the metadata record stored beside each blob.
const META_SUFFIX: &str = ".meta.json";
/// Longest accepted asset file name.
const MAX_NAME_LEN: usize = 255;
/// Fallback MIME type.
const OCTET_STREAM: &str = "application/octet-stream";

/// Persists uploaded assets independently of snapshots.
///
/// The store keeps no reference counts: deleting an asset that a saved
/// document still points at is allowed.
#[derive(Debug, Clone)]
pub struct AssetStore {
    provider: Arc<dyn StorageProvider>,
    /// Largest blob accepted by `upload`.
    max_asset_bytes: usize,
}

impl AssetStore {
    /// Create an asset store over `provider`.
    pub fn new(provider: Arc<dyn StorageProvider>, max_asset_bytes: usize) -> Self {
        Self {
            provider,
            max_asset_bytes,
        }
    }

    /// Store one blob under a freshly generated id.
    pub async fn upload(
        &self,
        project_id: &ProjectId,
        name: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> AppResult<AssetMeta> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Asset name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "Asset name exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if bytes.len() > self.max_asset_bytes {
            return Err(AppError::validation(format!(
                "Asset '{name}' is {} bytes, the limit is {} bytes",
                bytes.len(),
                self.max_asset_bytes
            )));
        }

        let meta = AssetMeta {
            asset_id: AssetId::new(),
            name: name.to_string(),
            content_type: resolve_content_type(name, content_type),
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        };
        let meta_bytes = serde_json::to_vec(&meta).map(Bytes::from).map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                "Failed to serialize asset metadata",
                e,
            )
        })?;

        let blob_path = blob_path(project_id, &meta.asset_id);
        self.provider.write_new(&blob_path, bytes).await?;

        if let Err(e) = self
            .provider
            .write_new(&meta_path(project_id, &meta.asset_id), meta_bytes)
            .await
        {
            // Without metadata the blob is unreachable; drop it.
            if let Err(cleanup) = self.provider.delete(&blob_path).await {
                warn!(
                    project_id = %project_id,
                    asset_id = %meta.asset_id,
                    error = %cleanup,
                    "Failed to remove orphaned asset blob"
                );
            }
            return Err(e);
        }

        info!(
            project_id = %project_id,
            asset_id = %meta.asset_id,
            name = %meta.name,
            content_type = %meta.content_type,
            bytes = meta.size_bytes,
            "Asset uploaded"
        );
        Ok(meta)
    }

    /// Upload every item concurrently; one outcome per item, in order.
    ///
    /// A failing item never rolls back or blocks the others.
    pub async fn upload_many(
        &self,
        project_id: &ProjectId,
        uploads: Vec<AssetUpload>,
    ) -> Vec<AppResult<AssetMeta>> {
        let tasks = uploads.into_iter().map(|item| async move {
            self.upload(project_id, &item.name, item.bytes, item.content_type.as_deref())
                .await
        });
        join_all(tasks).await
    }

    /// Remove an asset. Deleting an unknown id reports `NotFound` and is
    /// safe to repeat.
    pub async fn delete(&self, project_id: &ProjectId, asset_id: &AssetId) -> AppResult<DeleteOutcome> {
        let had_meta = self.provider.delete(&meta_path(project_id, asset_id)).await?;
        let had_blob = self.provider.delete(&blob_path(project_id, asset_id)).await?;

        if had_meta || had_blob {
            info!(project_id = %project_id, asset_id = %asset_id, "Asset deleted");
            Ok(DeleteOutcome::Deleted)
        } else {
            debug!(project_id = %project_id, asset_id = %asset_id, "Asset to delete was absent");
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// Delete every id concurrently; one outcome per id, in order.
    pub async fn delete_many(
        &self,
        project_id: &ProjectId,
        asset_ids: &[AssetId],
    ) -> Vec<AppResult<DeleteOutcome>> {
        join_all(asset_ids.iter().map(|id| self.delete(project_id, id))).await
    }

    /// Metadata of a stored asset.
    pub async fn meta(&self, project_id: &ProjectId, asset_id: &AssetId) -> AppResult<AssetMeta> {
        let raw = self
            .provider
            .read_bytes(&meta_path(project_id, asset_id))
            .await
            .map_err(|e| not_found_as_asset(e, asset_id))?;

        serde_json::from_slice(&raw).map_err(|e| {
            AppError::with_source(
                ErrorKind::Decoding,
                format!("Metadata of asset {asset_id} is corrupt"),
                e,
            )
        })
    }

    /// Load an asset fully into memory.
    pub async fn get(&self, project_id: &ProjectId, asset_id: &AssetId) -> AppResult<Asset> {
        let meta = self.meta(project_id, asset_id).await?;
        let bytes = self
            .provider
            .read_bytes(&blob_path(project_id, asset_id))
            .await
            .map_err(|e| not_found_as_asset(e, asset_id))?;
        Ok(Asset { meta, bytes })
    }

    /// Open an asset for streaming to a client.
    pub async fn open(
        &self,
        project_id: &ProjectId,
        asset_id: &AssetId,
    ) -> AppResult<(AssetMeta, ByteStream)> {
        let meta = self.meta(project_id, asset_id).await?;
        let stream = self
            .provider
            .read(&blob_path(project_id, asset_id))
            .await
            .map_err(|e| not_found_as_asset(e, asset_id))?;
        Ok((meta, stream))
    }
}

/// Declared type unless it is missing or generic; then guess from the name.
fn resolve_content_type(name: &str, declared: Option<&str>) -> String {
    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() && declared != OCTET_STREAM => declared.to_string(),
        _ => mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string(),
    }
}

fn not_found_as_asset(e: AppError, asset_id: &AssetId) -> AppError {
    if e.is_not_found() {
        AppError::not_found(format!("Asset {asset_id} not found"))
    } else {
        e
    }
}

fn blob_path(project_id: &ProjectId, asset_id: &AssetId) -> String {
    format!("{ASSET_ROOT}/{}/{asset_id}", project_id.as_str())
}

fn meta_path(project_id: &ProjectId, asset_id: &AssetId) -> String {
    format!("{ASSET_ROOT}/{}/{asset_id}{META_SUFFIX}", project_id.as_str())
}
