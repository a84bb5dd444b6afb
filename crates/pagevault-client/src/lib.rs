//! # pagevault-client
//!
//! Editor-side HTTP client for a PageVault server. [`PageVaultClient`]
//! implements [`SnapshotSink`](pagevault_core::traits::SnapshotSink), so an
//! autosave session can save straight to a remote server.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{ClientAsset, PageVaultClient};
pub use wire::{
    DeleteItem, DeleteItemStatus, HealthReport, SaveReceipt, UploadItem, UploadItemStatus,
};
