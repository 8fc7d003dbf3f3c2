use orgsync_common::types::EpochMillis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub id: String,
    pub user_id: String,
    pub organization_id: String,
    pub role_slug: String,
    pub status: String,
    pub created_at: EpochMillis,
    pub updated_at: EpochMillis,
}

/// Fields rewritten by an `organization_membership.updated` event.
#[derive(Debug, Clone)]
pub struct MembershipChanges {
    pub id: String,
    pub role_slug: String,
    pub status: String,
    pub updated_at: EpochMillis,
}
