use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::map_write_error;
use crate::organization::models::{Organization, OrganizationChanges};
use crate::organization::repositories::OrganizationRepository;
use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_common::types::EpochMillis;

#[derive(Clone)]
pub struct SqliteOrganizationRepository {
    pool: SqlitePool,
}

impl SqliteOrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: SqliteRow) -> Organization {
        Organization {
            id: row.get("id"),
            name: row.get("name"),
            created_at: EpochMillis::from(row.get::<i64, _>("created_at")),
            updated_at: EpochMillis::from(row.get::<i64, _>("updated_at")),
        }
    }
}

#[async_trait]
impl OrganizationRepository for SqliteOrganizationRepository {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<Organization>> {
        let row = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM organization WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(row.map(Self::map_row))
    }

    async fn create(&self, organization: &Organization) -> OrgsyncResult<Organization> {
        let row = sqlx::query(
            "INSERT INTO organization (id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(&organization.id)
        .bind(&organization.name)
        .bind(organization.created_at.as_i64())
        .bind(organization.updated_at.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("organization {}", organization.id)))?;

        tracing::debug!(id = %organization.id, name = %organization.name, "created organization");
        Ok(Self::map_row(row))
    }

    async fn update(&self, changes: &OrganizationChanges) -> OrgsyncResult<Option<Organization>> {
        let row = sqlx::query(
            "UPDATE organization
             SET name = ?2, updated_at = ?3
             WHERE id = ?1
             RETURNING id, name, created_at, updated_at",
        )
        .bind(&changes.id)
        .bind(&changes.name)
        .bind(changes.updated_at.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        if row.is_none() {
            tracing::debug!(id = %changes.id, "organization to update not found");
        }
        Ok(row.map(Self::map_row))
    }

    async fn delete(&self, id: &str) -> OrgsyncResult<Option<Organization>> {
        let row = sqlx::query(
            "DELETE FROM organization
             WHERE id = ?1
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        if row.is_none() {
            tracing::debug!(id, "organization to delete not found");
        }
        Ok(row.map(Self::map_row))
    }

    async fn list(&self) -> OrgsyncResult<Vec<Organization>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM organization
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    fn org(id: &str, name: &str) -> Organization {
        Organization {
            id: id.to_string(),
            name: name.to_string(),
            created_at: EpochMillis::new(1_000),
            updated_at: EpochMillis::new(1_000),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let repo = SqliteOrganizationRepository::new(test_pool().await);
        let created = repo.create(&org("org_1", "Acme")).await.expect("create");
        assert_eq!(created, org("org_1", "Acme"));

        let fetched = repo.get_by_id("org_1").await.expect("get");
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn create_twice_is_conflict() {
        let repo = SqliteOrganizationRepository::new(test_pool().await);
        repo.create(&org("org_1", "Acme")).await.expect("first create");

        let err = repo.create(&org("org_1", "Acme")).await.unwrap_err();
        assert!(matches!(err, OrgsyncError::Conflict(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn update_rewrites_name_and_keeps_created_at() {
        let repo = SqliteOrganizationRepository::new(test_pool().await);
        repo.create(&org("org_1", "Acme")).await.expect("create");

        let updated = repo
            .update(&OrganizationChanges {
                id: "org_1".to_string(),
                name: "Acme Inc".to_string(),
                updated_at: EpochMillis::new(2_000),
            })
            .await
            .expect("update")
            .expect("row should exist");
        assert_eq!(updated.name, "Acme Inc");
        assert_eq!(updated.created_at, EpochMillis::new(1_000));
        assert_eq!(updated.updated_at, EpochMillis::new(2_000));
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let repo = SqliteOrganizationRepository::new(test_pool().await);
        let result = repo
            .update(&OrganizationChanges {
                id: "org_missing".to_string(),
                name: "Nobody".to_string(),
                updated_at: EpochMillis::new(2_000),
            })
            .await
            .expect("update should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_returns_row_then_none() {
        let repo = SqliteOrganizationRepository::new(test_pool().await);
        repo.create(&org("org_1", "Acme")).await.expect("create");

        let deleted = repo.delete("org_1").await.expect("delete");
        assert_eq!(deleted.map(|o| o.id), Some("org_1".to_string()));

        let again = repo.delete("org_1").await.expect("second delete");
        assert!(again.is_none());
        assert!(repo.list().await.expect("list").is_empty());
    }
}
