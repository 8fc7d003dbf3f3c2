use orgsync_common::types::EpochMillis;
use serde::{Deserialize, Serialize};

/// One appended row of the `events_cursor` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsCursor {
    pub event_id: String,
    /// The full event record as received, serialized as JSON.
    pub event_payload: String,
    /// Creation time reported by the event source.
    pub created_at: EpochMillis,
    /// Wall-clock time at which the row was written.
    pub processed_at: EpochMillis,
}

#[derive(Debug, Clone)]
pub struct NewCheckpoint {
    pub event_id: String,
    pub event_payload: String,
    pub created_at: EpochMillis,
}
