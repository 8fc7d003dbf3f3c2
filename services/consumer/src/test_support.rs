//! Builders and doubles shared by the dispatcher and pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orgsync_common::error::{OrgsyncError, OrgsyncResult};
use orgsync_common::types::EpochMillis;
use orgsync_db::cursor::models::{EventsCursor, NewCheckpoint};
use orgsync_db::cursor::repositories::CheckpointRepository;
use orgsync_db::cursor::sqlite_repository::SqliteCheckpointRepository;
use orgsync_db::membership::sqlite_repository::SqliteMembershipRepository;
use orgsync_db::organization::sqlite_repository::SqliteOrganizationRepository;
use orgsync_db::user::models::{User, UserChanges};
use orgsync_db::user::repositories::UserRepository;
use orgsync_db::user::sqlite_repository::SqliteUserRepository;
use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::window::FetchWindow;
use crate::workos::client::{EventSource, EventSourceError};
use crate::workos::models::{EventPage, ListMetadata, SourceEvent};

/// 2024-09-06T18:03:00Z
const BASE_MILLIS: i64 = 1_725_645_780_000;

fn iso(seq: i64) -> String {
    EpochMillis::new(BASE_MILLIS + seq * 1_000).to_rfc3339()
}

fn event(id: &str, event_type: &str, seq: i64, data: serde_json::Value) -> SourceEvent {
    SourceEvent::from_value(json!({
        "object": "event",
        "id": id,
        "event": event_type,
        "createdAt": iso(seq),
        "data": data,
    }))
    .expect("test event should parse")
}

pub fn org_event(id: &str, event_type: &str, org_id: &str, name: &str, seq: i64) -> SourceEvent {
    event(
        id,
        event_type,
        seq,
        json!({
            "object": "organization",
            "id": org_id,
            "name": name,
            "createdAt": iso(0),
            "updatedAt": iso(seq),
        }),
    )
}

pub fn membership_event(
    id: &str,
    event_type: &str,
    membership_id: &str,
    role: &str,
    seq: i64,
) -> SourceEvent {
    event(
        id,
        event_type,
        seq,
        json!({
            "object": "organization_membership",
            "id": membership_id,
            "userId": "user_1",
            "organizationId": "org_1",
            "role": {"slug": role},
            "status": "active",
            "createdAt": iso(0),
            "updatedAt": iso(seq),
        }),
    )
}

pub fn user_event(id: &str, event_type: &str, user_id: &str, first_name: &str, seq: i64) -> SourceEvent {
    event(
        id,
        event_type,
        seq,
        json!({
            "object": "user",
            "id": user_id,
            "email": format!("{user_id}@example.com"),
            "emailVerified": true,
            "firstName": first_name,
            "lastName": "User",
            "profilePictureUrl": null,
            "createdAt": iso(0),
            "updatedAt": iso(seq),
        }),
    )
}

pub fn unknown_event(id: &str, event_type: &str, seq: i64) -> SourceEvent {
    event(id, event_type, seq, json!({"id": "whatever"}))
}

pub fn user_row(id: &str, first_name: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        email_verified: true,
        first_name: Some(first_name.to_string()),
        last_name: Some("User".to_string()),
        profile_picture_url: None,
        created_at: EpochMillis::new(BASE_MILLIS),
        updated_at: EpochMillis::new(BASE_MILLIS),
    }
}

pub fn page(events: Vec<SourceEvent>) -> EventPage {
    EventPage {
        data: events,
        list_metadata: ListMetadata::default(),
    }
}

/// In-memory SQLite database with every repository attached.
pub struct SqliteStore {
    pub checkpoints: SqliteCheckpointRepository,
    pub organizations: SqliteOrganizationRepository,
    pub memberships: SqliteMembershipRepository,
    pub users: SqliteUserRepository,
}

impl SqliteStore {
    pub fn dispatcher(
        &self,
    ) -> Dispatcher<SqliteOrganizationRepository, SqliteMembershipRepository, SqliteUserRepository>
    {
        Dispatcher::new(
            self.organizations.clone(),
            self.memberships.clone(),
            self.users.clone(),
        )
    }
}

pub async fn sqlite_store() -> SqliteStore {
    let pool = orgsync_db::create_pool("sqlite::memory:")
        .await
        .expect("db should open");
    orgsync_db::migrate(&pool).await.expect("schema should apply");

    SqliteStore {
        checkpoints: SqliteCheckpointRepository::new(pool.clone()),
        organizations: SqliteOrganizationRepository::new(pool.clone()),
        memberships: SqliteMembershipRepository::new(pool.clone()),
        users: SqliteUserRepository::new(pool),
    }
}

// ── Scripted EventSource ───────────────────────────────────────

/// Replays canned fetch results in order, then returns empty pages.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<EventPage, EventSourceError>>>,
    windows: Arc<Mutex<Vec<FetchWindow>>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<EventPage, EventSourceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            windows: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Windows requested so far.
    pub fn windows(&self) -> Arc<Mutex<Vec<FetchWindow>>> {
        Arc::clone(&self.windows)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch(&self, window: &FetchWindow) -> Result<EventPage, EventSourceError> {
        self.windows.lock().unwrap().push(window.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EventPage::default()))
    }
}

// ── Call-recording UserRepository ──────────────────────────────

pub struct RecordingRepo<R> {
    inner: R,
    calls: Arc<Mutex<Vec<String>>>,
}

impl<R> RecordingRepo<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl<R: UserRepository> UserRepository for RecordingRepo<R> {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<User>> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, user: &User) -> OrgsyncResult<User> {
        self.record(format!("create:{}", user.id));
        self.inner.create(user).await
    }

    async fn update(&self, changes: &UserChanges) -> OrgsyncResult<Option<User>> {
        self.record(format!("update:{}", changes.id));
        self.inner.update(changes).await
    }

    async fn delete(&self, id: &str) -> OrgsyncResult<Option<User>> {
        self.record(format!("delete:{id}"));
        self.inner.delete(id).await
    }

    async fn list(&self) -> OrgsyncResult<Vec<User>> {
        self.inner.list().await
    }
}

// ── CheckpointRepository that starts failing ───────────────────

pub struct FlakyCheckpoints<C> {
    inner: C,
    remaining_ok: Mutex<usize>,
}

impl<C> FlakyCheckpoints<C> {
    /// Let `successes` persists through, then fail every later one.
    pub fn failing_after(inner: C, successes: usize) -> Self {
        Self {
            inner,
            remaining_ok: Mutex::new(successes),
        }
    }
}

#[async_trait]
impl<C: CheckpointRepository> CheckpointRepository for FlakyCheckpoints<C> {
    async fn fetch_latest(&self) -> OrgsyncResult<Option<String>> {
        self.inner.fetch_latest().await
    }

    async fn persist(&self, checkpoint: &NewCheckpoint) -> OrgsyncResult<String> {
        {
            let mut remaining = self.remaining_ok.lock().unwrap();
            if *remaining == 0 {
                return Err(OrgsyncError::Persist("disk full".to_string()));
            }
            *remaining -= 1;
        }
        self.inner.persist(checkpoint).await
    }

    async fn list(&self) -> OrgsyncResult<Vec<EventsCursor>> {
        self.inner.list().await
    }
}

// ── CheckpointRepository that cannot be read ───────────────────

pub struct UnreadableCheckpoints;

#[async_trait]
impl CheckpointRepository for UnreadableCheckpoints {
    async fn fetch_latest(&self) -> OrgsyncResult<Option<String>> {
        Err(OrgsyncError::Database("no such table: events_cursor".to_string()))
    }

    async fn persist(&self, _checkpoint: &NewCheckpoint) -> OrgsyncResult<String> {
        Err(OrgsyncError::Persist("no such table: events_cursor".to_string()))
    }

    async fn list(&self) -> OrgsyncResult<Vec<EventsCursor>> {
        Ok(Vec::new())
    }
}
