use async_trait::async_trait;

use crate::cursor::models::{EventsCursor, NewCheckpoint};
use orgsync_common::error::OrgsyncResult;

#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Id of the most recently created event that was attempted, if any.
    /// Rows sharing a `created_at` resolve to the last one appended.
    async fn fetch_latest(&self) -> OrgsyncResult<Option<String>>;

    /// Append a checkpoint row stamped with the current time as `processed_at`.
    /// Returns the persisted event id. Never updates an existing row.
    async fn persist(&self, checkpoint: &NewCheckpoint) -> OrgsyncResult<String>;

    /// All rows in append order.
    async fn list(&self) -> OrgsyncResult<Vec<EventsCursor>>;
}
