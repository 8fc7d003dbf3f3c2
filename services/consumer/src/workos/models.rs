use orgsync_common::types::EpochMillis;
use orgsync_db::membership::models::{MembershipChanges, OrganizationMembership};
use orgsync_db::organization::models::{Organization, OrganizationChanges};
use orgsync_db::user::models::{User, UserChanges};
use serde::{Deserialize, Serialize};

/// The event types requested from the Events API. Anything else is ignored.
pub const EVENT_ALLOWLIST: [&str; 9] = [
    "organization.created",
    "organization.updated",
    "organization.deleted",
    "organization_membership.created",
    "organization_membership.updated",
    "organization_membership.deleted",
    "user.created",
    "user.updated",
    "user.deleted",
];

/// Maximum page size requested per fetch.
pub const PAGE_LIMIT: usize = 100;

/// Fields every event record carries regardless of its type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope {
    id: String,
    event: String,
    created_at: EpochMillis,
}

/// One record from the Events API, with its envelope parsed and the full
/// record kept for checkpointing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub id: String,
    pub event: String,
    pub created_at: EpochMillis,
    pub raw: serde_json::Value,
}

impl SourceEvent {
    pub fn from_value(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let envelope = EventEnvelope::deserialize(&raw)?;
        Ok(Self {
            id: envelope.id,
            event: envelope.event,
            created_at: envelope.created_at,
            raw,
        })
    }

    /// The record as stored in the checkpoint table.
    pub fn payload_json(&self) -> String {
        self.raw.to_string()
    }

    /// Decode the type-specific `data` for this event's declared type.
    ///
    /// Fails only when the type is known but its data does not match.
    pub fn kind(&self) -> Result<EventKind, serde_json::Error> {
        let data = self
            .raw
            .get("data")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        let kind = match self.event.as_str() {
            "organization.created" => EventKind::OrganizationCreated(serde_json::from_value(data)?),
            "organization.updated" => EventKind::OrganizationUpdated(serde_json::from_value(data)?),
            "organization.deleted" => EventKind::OrganizationDeleted(serde_json::from_value(data)?),
            "organization_membership.created" => {
                EventKind::MembershipCreated(serde_json::from_value(data)?)
            }
            "organization_membership.updated" => {
                EventKind::MembershipUpdated(serde_json::from_value(data)?)
            }
            "organization_membership.deleted" => {
                EventKind::MembershipDeleted(serde_json::from_value(data)?)
            }
            "user.created" => EventKind::UserCreated(serde_json::from_value(data)?),
            "user.updated" => EventKind::UserUpdated(serde_json::from_value(data)?),
            "user.deleted" => EventKind::UserDeleted(serde_json::from_value(data)?),
            other => EventKind::Unrecognized(other.to_string()),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    OrganizationCreated(OrganizationData),
    OrganizationUpdated(OrganizationData),
    OrganizationDeleted(DeletedData),
    MembershipCreated(MembershipData),
    MembershipUpdated(MembershipData),
    MembershipDeleted(DeletedData),
    UserCreated(UserData),
    UserUpdated(UserData),
    UserDeleted(DeletedData),
    Unrecognized(String),
}

/// Data of a `*.deleted` event. Only the id is needed to remove the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedData {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationData {
    pub id: String,
    pub name: String,
    pub created_at: EpochMillis,
    pub updated_at: EpochMillis,
}

impl OrganizationData {
    pub fn to_row(&self) -> Organization {
        Organization {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_changes(&self) -> OrganizationChanges {
        OrganizationChanges {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRole {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipData {
    pub id: String,
    pub user_id: String,
    pub organization_id: String,
    pub role: MembershipRole,
    pub status: String,
    pub created_at: EpochMillis,
    pub updated_at: EpochMillis,
}

impl MembershipData {
    pub fn to_row(&self) -> OrganizationMembership {
        OrganizationMembership {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            organization_id: self.organization_id.clone(),
            role_slug: self.role.slug.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_changes(&self) -> MembershipChanges {
        MembershipChanges {
            id: self.id.clone(),
            role_slug: self.role.slug.clone(),
            status: self.status.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: EpochMillis,
    pub updated_at: EpochMillis,
}

impl UserData {
    pub fn to_row(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture_url: self.profile_picture_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_changes(&self) -> UserChanges {
        UserChanges {
            id: self.id.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture_url: self.profile_picture_url.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMetadata {
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEventList {
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub list_metadata: ListMetadata,
}

/// One page of events, in the order the source returned them.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub data: Vec<SourceEvent>,
    pub list_metadata: ListMetadata,
}

impl EventPage {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}
