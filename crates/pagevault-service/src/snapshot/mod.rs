//! Snapshot persistence: ordering keys and the append-only snapshot store.

pub mod key;
pub mod store;

pub use key::KeyGenerator;
pub use store::{Snapshot, SnapshotStore};
