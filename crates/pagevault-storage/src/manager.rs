//! Storage manager: builds the configured provider and hands it out.

use std::sync::Arc;

use tracing::info;

use pagevault_core::config::StorageConfig;
use pagevault_core::error::AppError;
use pagevault_core::result::AppResult;
use pagevault_core::traits::storage::StorageProvider;

use crate::providers::{LocalStorageProvider, MemoryStorageProvider};

/// Owns the provider shared by the snapshot and asset stores.
#[derive(Debug, Clone)]
pub struct StorageManager {
    provider: Arc<dyn StorageProvider>,
}

impl StorageManager {
    /// Build the provider named by `config.provider`.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let provider: Arc<dyn StorageProvider> = match config.provider.as_str() {
            "local" => Arc::new(LocalStorageProvider::new(&config.local.root_path).await?),
            "memory" => Arc::new(MemoryStorageProvider::new()),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider '{other}' (expected 'local' or 'memory')"
                )));
            }
        };

        info!(
            provider = provider.provider_type(),
            "Storage provider initialized"
        );
        Ok(Self { provider })
    }

    /// Wrap an already constructed provider.
    pub fn from_provider(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// The active provider.
    pub fn provider(&self) -> Arc<dyn StorageProvider> {
        Arc::clone(&self.provider)
    }

    /// Check health of the active provider.
    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }
}
