//! # pagevault-service
//!
//! Persistence logic for PageVault: the blob codec, the append-only
//! snapshot store, the asset store, and the editor-side autosave
//! coordinator.
//!
//! Stores follow constructor injection: the storage provider is handed in
//! at construction time as an `Arc<dyn StorageProvider>`.

pub mod asset;
pub mod autosave;
pub mod codec;
pub mod snapshot;

#[cfg(test)]
mod test_support;

pub use asset::{Asset, AssetMeta, AssetStore, AssetUpload, DeleteOutcome};
pub use autosave::{AutosaveCoordinator, AutosaveHandle, AutosaveState, AutosaveStatus};
pub use codec::BlobCodec;
pub use snapshot::{KeyGenerator, Snapshot, SnapshotStore};
