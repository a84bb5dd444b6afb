//! Asset records and per-item batch outcomes.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pagevault_core::types::AssetId;

/// Metadata stored next to every asset blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    /// Identifier the document references the asset by.
    pub asset_id: AssetId,
    /// Original file name supplied on upload.
    pub name: String,
    /// MIME type served back to clients.
    pub content_type: String,
    /// Blob size.
    pub size_bytes: u64,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// A stored asset with its bytes loaded.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Stored metadata.
    pub meta: AssetMeta,
    /// Blob contents.
    pub bytes: Bytes,
}

/// One item of an upload batch.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    /// File name as sent by the client.
    pub name: String,
    /// Blob contents.
    pub bytes: Bytes,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
}

impl AssetUpload {
    /// Create an upload item.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            content_type,
        }
    }
}

/// Result of deleting one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The asset existed and was removed.
    Deleted,
    /// Nothing was stored under that id.
    NotFound,
}
