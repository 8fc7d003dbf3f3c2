use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_db::membership::repositories::MembershipRepository;
use orgsync_db::organization::repositories::OrganizationRepository;
use orgsync_db::user::repositories::UserRepository;

use crate::workos::models::{EventKind, SourceEvent};

/// Result of routing one event to its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The row was created, updated or deleted.
    Applied,
    /// Update or delete targeted an id with no row.
    NotFound,
    /// Event type outside the allow-list; nothing was touched.
    Skipped,
}

fn found<T>(row: Option<T>) -> MutationOutcome {
    match row {
        Some(_) => MutationOutcome::Applied,
        None => MutationOutcome::NotFound,
    }
}

/// Routes events to the organization, membership and user repositories.
pub struct Dispatcher<O, M, U> {
    organizations: O,
    memberships: M,
    users: U,
}

impl<O, M, U> Dispatcher<O, M, U>
where
    O: OrganizationRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    pub fn new(organizations: O, memberships: M, users: U) -> Self {
        Self {
            organizations,
            memberships,
            users,
        }
    }

    /// Apply a single event. Any error is a mutation failure for this event.
    pub async fn dispatch(&self, event: &SourceEvent) -> OrgsyncResult<MutationOutcome> {
        let kind = event
            .kind()
            .map_err(|e| OrgsyncError::Payload(format!("{} data: {e}", event.event)))?;

        let outcome = match kind {
            EventKind::OrganizationCreated(data) => {
                self.organizations.create(&data.to_row()).await?;
                MutationOutcome::Applied
            }
            EventKind::OrganizationUpdated(data) => {
                found(self.organizations.update(&data.to_changes()).await?)
            }
            EventKind::OrganizationDeleted(data) => found(self.organizations.delete(&data.id).await?),

            EventKind::MembershipCreated(data) => {
                self.memberships.create(&data.to_row()).await?;
                MutationOutcome::Applied
            }
            EventKind::MembershipUpdated(data) => {
                found(self.memberships.update(&data.to_changes()).await?)
            }
            EventKind::MembershipDeleted(data) => found(self.memberships.delete(&data.id).await?),

            EventKind::UserCreated(data) => {
                self.users.create(&data.to_row()).await?;
                MutationOutcome::Applied
            }
            EventKind::UserUpdated(data) => found(self.users.update(&data.to_changes()).await?),
            EventKind::UserDeleted(data) => found(self.users.delete(&data.id).await?),

            EventKind::Unrecognized(event_type) => {
                tracing::info!(%event_type, "skipping unhandled event");
                MutationOutcome::Skipped
            }
        };

        Ok(outcome)
    }
}
