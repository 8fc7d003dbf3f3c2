use async_trait::async_trait;

use crate::organization::models::{Organization, OrganizationChanges};
use orgsync_common::error::OrgsyncResult;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<Organization>>;

    /// Insert a new organization. Fails with `Conflict` if the id already exists.
    async fn create(&self, organization: &Organization) -> OrgsyncResult<Organization>;

    /// Returns `None` if no organization has this id.
    async fn update(&self, changes: &OrganizationChanges) -> OrgsyncResult<Option<Organization>>;

    /// Returns the deleted row, or `None` if no organization has this id.
    async fn delete(&self, id: &str) -> OrgsyncResult<Option<Organization>>;

    async fn list(&self) -> OrgsyncResult<Vec<Organization>>;
}
