//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod autosave;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::autosave::AutosaveConfig;
pub use self::logging::LoggingConfig;
pub use self::storage::{LocalStorageConfig, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable medium settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Implicit project settings.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Editor-side autosave policy.
    #[serde(default)]
    pub autosave: AutosaveConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The project served by this deployment.
///
/// There is exactly one implicit project per deployment; keying storage by
/// this id keeps that a deployment choice rather than a storage-layer one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier used as the storage namespace.
    #[serde(default = "default_project_id")]
    pub id: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            id: default_project_id(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the TOML files in `dir`.
    ///
    /// Merges `default.toml` with an environment-specific overlay and
    /// environment variables prefixed with `PAGEVAULT__`. Missing files are
    /// skipped.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PAGEVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_project_id() -> String {
    "default".to_string()
}
