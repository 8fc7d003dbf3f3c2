pub mod cursor;
pub mod membership;
pub mod organization;
pub mod user;

use std::str::FromStr;

use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Create a SQLite connection pool from a database URL.
///
/// An in-memory database lives only as long as its connection, so
/// `sqlite::memory:` URLs get a single connection that is never recycled.
pub async fn create_pool(database_url: &str) -> OrgsyncResult<SqlitePool> {
    tracing::info!("connecting to database");

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let mut opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| OrgsyncError::Config(format!("invalid DATABASE_URL: {e}")))?
        .create_if_missing(true);
    if !in_memory {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_opts = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_opts
        .connect_with(opts)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))
}

/// Create the mirror and checkpoint tables if they do not exist yet.
pub async fn migrate(pool: &SqlitePool) -> OrgsyncResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;
    tracing::debug!("schema ensured");
    Ok(())
}

/// Map a sqlx error, turning unique-key violations into `Conflict`.
pub(crate) fn map_write_error(err: sqlx::Error, what: &str) -> OrgsyncError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            OrgsyncError::Conflict(format!("{what} already exists"))
        }
        _ => OrgsyncError::Database(err.to_string()),
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events_cursor (
  event_id TEXT NOT NULL,
  event_payload TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  processed_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS events_cursor_created_at_idx
  ON events_cursor(created_at DESC);

CREATE TABLE IF NOT EXISTS organization (
  id TEXT PRIMARY KEY NOT NULL,
  name TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS organization_membership (
  id TEXT PRIMARY KEY NOT NULL,
  user_id TEXT NOT NULL,
  organization_id TEXT NOT NULL,
  role_slug TEXT NOT NULL,
  status TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS "user" (
  id TEXT PRIMARY KEY NOT NULL,
  email TEXT NOT NULL,
  email_verified INTEGER NOT NULL,
  first_name TEXT,
  last_name TEXT,
  profile_picture_url TEXT,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
"#;

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = create_pool("sqlite::memory:").await.expect("db should open");
    migrate(&pool).await.expect("schema should apply");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_pool_fails_with_invalid_url() {
        let result = create_pool("sqlite://orgsync.db?mode=bogus").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = test_pool().await;
        migrate(&pool).await.expect("second migrate should be a no-op");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("should list tables");
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["events_cursor", "organization", "organization_membership", "user"]
        );
    }
}
