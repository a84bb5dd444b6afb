//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `DELETE /api/delete-assets`.
///
/// Ids stay strings here so that one malformed id is reported per item
/// instead of rejecting the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAssetsRequest {
    /// Assets to delete.
    #[validate(length(min = 1, max = 100, message = "Provide between 1 and 100 asset ids"))]
    pub asset_ids: Vec<String>,
}
