use async_trait::async_trait;

use crate::membership::models::{MembershipChanges, OrganizationMembership};
use orgsync_common::error::OrgsyncResult;

/// Memberships reference organizations and users by id only; the referenced
/// rows are not required to exist.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<OrganizationMembership>>;

    /// Insert a new membership. Fails with `Conflict` if the id already exists.
    async fn create(
        &self,
        membership: &OrganizationMembership,
    ) -> OrgsyncResult<OrganizationMembership>;

    async fn update(
        &self,
        changes: &MembershipChanges,
    ) -> OrgsyncResult<Option<OrganizationMembership>>;

    async fn delete(&self, id: &str) -> OrgsyncResult<Option<OrganizationMembership>>;

    async fn list(&self) -> OrgsyncResult<Vec<OrganizationMembership>>;
}
