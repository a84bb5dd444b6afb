//! Core traits defined in `pagevault-core` and implemented by other crates.

pub mod snapshot;
pub mod storage;

pub use snapshot::SnapshotSink;
pub use storage::StorageProvider;
