//! # pagevault-core
//!
//! Core crate for PageVault. Contains traits, configuration schemas,
//! typed identifiers, the editor document type, and the unified error system.
//!
//! This crate has **no** internal dependencies on other PageVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
