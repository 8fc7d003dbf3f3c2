use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::cursor::models::{EventsCursor, NewCheckpoint};
use crate::cursor::repositories::CheckpointRepository;
use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_common::types::EpochMillis;

#[derive(Clone)]
pub struct SqliteCheckpointRepository {
    pool: SqlitePool,
}

impl SqliteCheckpointRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: SqliteRow) -> EventsCursor {
        EventsCursor {
            event_id: row.get("event_id"),
            event_payload: row.get("event_payload"),
            created_at: EpochMillis::from(row.get::<i64, _>("created_at")),
            processed_at: EpochMillis::from(row.get::<i64, _>("processed_at")),
        }
    }
}

#[async_trait]
impl CheckpointRepository for SqliteCheckpointRepository {
    async fn fetch_latest(&self) -> OrgsyncResult<Option<String>> {
        let row = sqlx::query(
            "SELECT event_id FROM events_cursor
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(row.map(|r| r.get("event_id")))
    }

    async fn persist(&self, checkpoint: &NewCheckpoint) -> OrgsyncResult<String> {
        let row = sqlx::query(
            "INSERT INTO events_cursor (event_id, event_payload, created_at, processed_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING event_id",
        )
        .bind(&checkpoint.event_id)
        .bind(&checkpoint.event_payload)
        .bind(checkpoint.created_at.as_i64())
        .bind(EpochMillis::now().as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Persist(e.to_string()))?;

        let event_id: String = row.get("event_id");
        tracing::debug!(event_id = %event_id, "checkpoint appended");
        Ok(event_id)
    }

    async fn list(&self) -> OrgsyncResult<Vec<EventsCursor>> {
        let rows = sqlx::query(
            "SELECT event_id, event_payload, created_at, processed_at
             FROM events_cursor
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }
}
