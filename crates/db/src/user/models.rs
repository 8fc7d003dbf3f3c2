use orgsync_common::types::EpochMillis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Stored as 0/1.
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: EpochMillis,
    pub updated_at: EpochMillis,
}

/// Fields rewritten by a `user.updated` event.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub updated_at: EpochMillis,
}
