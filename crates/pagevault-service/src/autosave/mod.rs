//! Editor-side autosave policy.
//!
//! One coordinator task per open document session owns the session's
//! [`Document`](pagevault_core::types::Document) and decides when to push it
//! through a [`SnapshotSink`](pagevault_core::traits::SnapshotSink).

pub mod coordinator;
pub mod status;

pub use coordinator::{AutosaveCoordinator, AutosaveHandle};
pub use status::{AutosaveState, AutosaveStatus};
