use async_trait::async_trait;

use crate::user::models::{User, UserChanges};
use orgsync_common::error::OrgsyncResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> OrgsyncResult<Option<User>>;

    /// Insert a new user. Fails with `Conflict` if the id already exists.
    async fn create(&self, user: &User) -> OrgsyncResult<User>;

    async fn update(&self, changes: &UserChanges) -> OrgsyncResult<Option<User>>;

    async fn delete(&self, id: &str) -> OrgsyncResult<Option<User>>;

    async fn list(&self) -> OrgsyncResult<Vec<User>>;
}
