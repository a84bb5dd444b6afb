//! Response DTOs.

use serde::{Deserialize, Serialize};

use pagevault_core::types::OrderingKey;

/// Wrapper for list-shaped responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    /// Wraps `data`.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body of a successful `POST /api/save-project`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProjectResponse {
    /// Confirmation message.
    pub message: String,
    /// Key the snapshot was published under.
    pub ordering_key: OrderingKey,
}

/// Per-item status of an asset upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Stored.
    Uploaded,
    /// Rejected or failed; see `error`.
    Error,
}

/// One item of a `POST /api/save-assets` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadItemResponse {
    /// File name as sent by the client.
    pub name: String,
    /// Outcome.
    pub status: UploadStatus,
    /// Assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// URL the asset is served from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Stored MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Stored size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item status of an asset delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    /// Removed.
    Deleted,
    /// Nothing stored under that id.
    NotFound,
    /// Not a well-formed asset id.
    Invalid,
    /// Storage failure; see `error`.
    Error,
}

/// One item of a `DELETE /api/delete-assets` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemResponse {
    /// Id as sent by the client.
    pub asset_id: String,
    /// Outcome.
    pub status: DeleteStatus,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Storage provider and reachability.
    pub storage: StorageHealth,
}

/// Storage part of the health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageHealth {
    /// Provider type.
    pub provider: String,
    /// Whether the provider answered its health check.
    pub healthy: bool,
}
