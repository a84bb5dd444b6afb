//! Observable state of an autosave session.

use serde::{Deserialize, Serialize};

use pagevault_core::types::OrderingKey;

/// Where the session sits in its save cycle: `Idle -> PendingSave -> Saving -> Idle`.
///
/// `PendingSave` is published when a trigger fires and is replaced by
/// `Saving` as soon as the save is issued. A trigger that lands while a save
/// is in flight leaves the state at `Saving` and sets `queued` on
/// [`AutosaveStatus`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutosaveState {
    /// No save running.
    #[default]
    Idle,
    /// A trigger fired and the save is about to be issued.
    PendingSave,
    /// A save is in flight.
    Saving,
}

/// Snapshot of a session, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutosaveStatus {
    /// Current state.
    pub state: AutosaveState,
    /// Edits not yet covered by a started save.
    pub pending_edits: u32,
    /// A follow-up save is queued behind the one in flight.
    pub queued: bool,
    /// Key of the most recent successful save.
    pub last_key: Option<OrderingKey>,
    /// Message of the most recent failed save, cleared on success.
    pub last_error: Option<String>,
    /// Saves issued to the sink.
    pub saves_started: u64,
    /// Saves the sink acknowledged.
    pub saves_succeeded: u64,
    /// Saves the sink rejected.
    pub saves_failed: u64,
}

impl AutosaveStatus {
    /// Whether every edit made so far is durably saved.
    pub fn is_clean(&self) -> bool {
        self.state == AutosaveState::Idle && self.pending_edits == 0 && !self.queued
    }
}
