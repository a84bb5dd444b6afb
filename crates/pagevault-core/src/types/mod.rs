//! Core type definitions used across the PageVault workspace.

pub mod document;
pub mod id;
pub mod ordering_key;

pub use document::Document;
pub use id::*;
pub use ordering_key::OrderingKey;
