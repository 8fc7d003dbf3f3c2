use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::map_write_error;
use crate::membership::models::{MembershipChanges, OrganizationMembership};
use crate::membership::repositories::MembershipRepository;
use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_common::types::EpochMillis;

const COLUMNS: &str =
    "id, user_id, organization_id, role_slug, status, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteMembershipRepository {
    pool: SqlitePool,
}

impl SqliteMembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: SqliteRow) -> OrganizationMembership {
        OrganizationMembership {
            id: row.get("id"),
            user_id: row.get("user_id"),
            organization_id: row.get("organization_id"),
            role_slug: row.get("role_slug"),
            status: row.get("status"),
            created_at: EpochMillis::from(row.get::<i64, _>("created_at")),
            updated_at: EpochMillis::from(row.get::<i64, _>("updated_at")),
        }
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepository {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<OrganizationMembership>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM organization_membership WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(row.map(Self::map_row))
    }

    async fn create(
        &self,
        membership: &OrganizationMembership,
    ) -> OrgsyncResult<OrganizationMembership> {
        let row = sqlx::query(&format!(
            "INSERT INTO organization_membership ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {COLUMNS}"
        ))
        .bind(&membership.id)
        .bind(&membership.user_id)
        .bind(&membership.organization_id)
        .bind(&membership.role_slug)
        .bind(&membership.status)
        .bind(membership.created_at.as_i64())
        .bind(membership.updated_at.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("organization membership {}", membership.id)))?;

        tracing::debug!(
            id = %membership.id,
            user_id = %membership.user_id,
            organization_id = %membership.organization_id,
            "created organization membership"
        );
        Ok(Self::map_row(row))
    }

    async fn update(
        &self,
        changes: &MembershipChanges,
    ) -> OrgsyncResult<Option<OrganizationMembership>> {
        let row = sqlx::query(&format!(
            "UPDATE organization_membership
             SET role_slug = ?2, status = ?3, updated_at = ?4
             WHERE id = ?1
             RETURNING {COLUMNS}"
        ))
        .bind(&changes.id)
        .bind(&changes.role_slug)
        .bind(&changes.status)
        .bind(changes.updated_at.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        if row.is_none() {
            tracing::debug!(id = %changes.id, "organization membership to update not found");
        }
        Ok(row.map(Self::map_row))
    }

    async fn delete(&self, id: &str) -> OrgsyncResult<Option<OrganizationMembership>> {
        let row = sqlx::query(&format!(
            "DELETE FROM organization_membership WHERE id = ?1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        if row.is_none() {
            tracing::debug!(id, "organization membership to delete not found");
        }
        Ok(row.map(Self::map_row))
    }

    async fn list(&self) -> OrgsyncResult<Vec<OrganizationMembership>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM organization_membership ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrgsyncError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }
}
