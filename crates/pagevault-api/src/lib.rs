//! # pagevault-api
//!
//! HTTP API layer for PageVault built on Axum.
//!
//! Exposes the snapshot store and the asset store to the editing client:
//! save/load of the project document, snapshot history, asset upload,
//! delete and serving. Handlers only (de)serialize and map error kinds to
//! status codes; all persistence rules live in `pagevault-service`.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state};
pub use error::ApiError;
pub use state::AppState;
