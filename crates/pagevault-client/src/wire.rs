//! Response bodies as the server sends them.

use serde::Deserialize;

use pagevault_core::types::OrderingKey;

/// `{ "data": ... }` envelope used by list-shaped responses.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Error body of a failed request.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Acknowledgement of a saved project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub message: String,
    pub ordering_key: OrderingKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadItemStatus {
    Uploaded,
    Error,
}

/// Outcome of one uploaded file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadItem {
    pub name: String,
    pub status: UploadItemStatus,
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Path to embed in the document to reference the asset.
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteItemStatus {
    Deleted,
    NotFound,
    Invalid,
    Error,
}

/// Outcome of one deleted asset id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItem {
    pub asset_id: String,
    pub status: DeleteItemStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Server health.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub storage: StorageReport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageReport {
    pub provider: String,
    pub healthy: bool,
}
