use orgsync_common::types::EpochMillis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: EpochMillis,
    pub updated_at: EpochMillis,
}

/// Fields rewritten by an `organization.updated` event.
#[derive(Debug, Clone)]
pub struct OrganizationChanges {
    pub id: String,
    pub name: String,
    pub updated_at: EpochMillis,
}
