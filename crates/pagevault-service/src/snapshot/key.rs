//! Ordering key generation.
//!
//! Keys are issued per project from a cursor that only moves forward. A key
//! is the wall-clock millisecond plus a sequence number, so two saves in the
//! same millisecond (or a clock that steps backwards) still produce strictly
//! increasing keys.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use pagevault_core::result::AppResult;
use pagevault_core::types::{OrderingKey, ProjectId};
use pagevault_core::types::ordering_key::MAX_SEQUENCE;

/// Issues strictly increasing [`OrderingKey`]s per project.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    /// Last key issued or observed for each project.
    cursors: DashMap<ProjectId, OrderingKey>,
}

impl KeyGenerator {
    /// Create a generator with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next key for `project_id` using the current time.
    pub fn next(&self, project_id: &ProjectId) -> AppResult<OrderingKey> {
        self.next_at(project_id, Utc::now())
    }

    /// Issue the next key for `project_id` as if the clock read `now`.
    pub fn next_at(&self, project_id: &ProjectId, now: DateTime<Utc>) -> AppResult<OrderingKey> {
        let now_ms = now.timestamp_millis();
        // The entry guard serializes issuers for the same project.
        match self.cursors.entry(project_id.clone()) {
            Entry::Occupied(mut cursor) => {
                let key = successor(*cursor.get(), now_ms)?;
                cursor.insert(key);
                Ok(key)
            }
            Entry::Vacant(slot) => {
                let key = OrderingKey::from_millis(now_ms, 0)?;
                slot.insert(key);
                Ok(key)
            }
        }
    }

    /// Record a key that exists elsewhere so later keys sort after it.
    pub fn observe(&self, project_id: &ProjectId, key: OrderingKey) {
        self.cursors
            .entry(project_id.clone())
            .and_modify(|cursor| {
                if key > *cursor {
                    *cursor = key;
                }
            })
            .or_insert(key);
    }

    /// Last key issued or observed for `project_id`.
    pub fn last(&self, project_id: &ProjectId) -> Option<OrderingKey> {
        self.cursors.get(project_id).map(|cursor| *cursor)
    }
}

/// Smallest key strictly greater than `last` that is not earlier than `now_ms`.
fn successor(last: OrderingKey, now_ms: i64) -> AppResult<OrderingKey> {
    if now_ms > last.millis() {
        OrderingKey::from_millis(now_ms, 0)
    } else if last.sequence() < MAX_SEQUENCE {
        OrderingKey::from_millis(last.millis(), last.sequence() + 1)
    } else {
        OrderingKey::from_millis(last.millis() + 1, 0)
    }
}
