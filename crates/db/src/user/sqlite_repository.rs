use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::map_write_error;
use crate::user::models::{User, UserChanges};
use crate::user::repositories::UserRepository;
use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_common::types::EpochMillis;

const COLUMNS: &str = "id, email, email_verified, first_name, last_name, profile_picture_url, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: SqliteRow) -> User {
        User {
            id: row.get("id"),
            email: row.get("email"),
            email_verified: row.get::<i64, _>("email_verified") != 0,
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            profile_picture_url: row.get("profile_picture_url"),
            created_at: EpochMillis::from(row.get::<i64, _>("created_at")),
            updated_at: EpochMillis::from(row.get::<i64, _>("updated_at")),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<User>> {
        let row = sqlx::query(&format!(r#"SELECT {COLUMNS} FROM "user" WHERE id = ?1"#))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(row.map(Self::map_row))
    }

    async fn create(&self, user: &User) -> OrgsyncResult<User> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO "user" ({COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               RETURNING {COLUMNS}"#
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(i64::from(user.email_verified))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture_url)
        .bind(user.created_at.as_i64())
        .bind(user.updated_at.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("user {}", user.id)))?;

        tracing::debug!(id = %user.id, email = %user.email, "created user");
        Ok(Self::map_row(row))
    }

    async fn update(&self, changes: &UserChanges) -> OrgsyncResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"UPDATE "user"
               SET email = ?2, email_verified = ?3, first_name = ?4, last_name = ?5,
                   profile_picture_url = ?6, updated_at = ?7
               WHERE id = ?1
               RETURNING {COLUMNS}"#
        ))
        .bind(&changes.id)
        .bind(&changes.email)
        .bind(i64::from(changes.email_verified))
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.profile_picture_url)
        .bind(changes.updated_at.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        if row.is_none() {
            tracing::debug!(id = %changes.id, "user to update not found");
        }
        Ok(row.map(Self::map_row))
    }

    async fn delete(&self, id: &str) -> OrgsyncResult<Option<User>> {
        let row = sqlx::query(&format!(r#"DELETE FROM "user" WHERE id = ?1 RETURNING {COLUMNS}"#))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        if row.is_none() {
            tracing::debug!(id, "user to delete not found");
        }
        Ok(row.map(Self::map_row))
    }

    async fn list(&self) -> OrgsyncResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {COLUMNS} FROM "user" ORDER BY created_at ASC, id ASC"#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }
}
