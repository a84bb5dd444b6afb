//! # pagevault-storage
//!
//! Durable media for PageVault snapshots and assets. Supports the local
//! filesystem and an in-process map.

pub mod manager;
pub mod providers;

pub use manager::StorageManager;
