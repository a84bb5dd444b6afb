//! PageVault Server: project snapshot and asset persistence for the page builder.
//!
//! Main entry point that wires configuration, storage and the HTTP API
//! together and starts the server.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use pagevault_core::config::AppConfig;
use pagevault_core::error::AppError;

/// Command-line flags; they override values loaded from configuration.
#[derive(Debug, Parser)]
#[command(name = "pagevault-server", version, about = "PageVault persistence server")]
struct Cli {
    /// Environment overlay loaded from `config/<env>.toml`.
    #[arg(short, long, env = "PAGEVAULT_ENV", default_value = "development")]
    env: String,

    /// Directory holding `default.toml` and the environment overlays.
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Bind address.
    #[arg(long)]
    host: Option<String>,

    /// Bind port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %cli.env, config_dir = %cli.config_dir, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e.detail(), "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment, then apply CLI overrides.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load_from(&cli.config_dir, &cli.env)?;

    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PageVault v{}", env!("CARGO_PKG_VERSION"));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    // ── Step 1: Storage, stores and shared state ─────────────────
    let state = pagevault_api::build_state(config).await?;
    let provider = state.storage_manager.provider();
    tracing::info!(
        project_id = %state.project_id,
        provider = provider.provider_type(),
        "Persistence layer initialized"
    );

    // ── Step 2: Build and start HTTP server ──────────────────────
    let app = pagevault_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("PageVault server listening on {}", addr);

    // ── Step 3: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining in-flight requests...");
    });

    // In-flight saves run to completion; the grace period bounds the wait
    // once a signal arrived.
    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;
        }
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, forcing shutdown");
        }
    }

    tracing::info!("PageVault server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
