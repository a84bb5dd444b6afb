//! Snapshot history paging query parameters.

use serde::{Deserialize, Serialize};

use pagevault_core::error::AppError;
use pagevault_core::types::OrderingKey;

/// Largest page of snapshot keys served at once.
pub const MAX_PAGE_SIZE: usize = 100;

/// Query parameters of `GET /api/snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPageParams {
    /// Resume after this key (exclusive); newest first when absent.
    pub before: Option<String>,
    /// Keys per page (default: 25, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    25
}

impl SnapshotPageParams {
    /// Parses the cursor and clamps the limit.
    pub fn into_cursor(self) -> Result<(Option<OrderingKey>, usize), AppError> {
        let before = self
            .before
            .filter(|raw| !raw.is_empty())
            .map(|raw| raw.parse::<OrderingKey>())
            .transpose()?;
        Ok((before, self.limit.clamp(1, MAX_PAGE_SIZE)))
    }
}
