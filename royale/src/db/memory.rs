//! In-process credential store.
//!
//! Used for development runs without PostgreSQL (`--in-memory`) and by the
//! test suites. All state sits behind one `RwLock`, so the uniqueness check
//! and the insert happen under the same write guard.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::repository::UserRepository;
use crate::user::{NewUserRecord, SubmissionId, UserId, UserRecord};

#[derive(Default)]
struct Inner {
    /// Records in creation order
    users: Vec<UserRecord>,
    by_id: HashMap<UserId, usize>,
    by_username: HashMap<String, usize>,
}

/// Memory-backed implementation of `UserRepository`
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<Inner>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, record: &NewUserRecord) -> StoreResult<UserRecord> {
        let mut inner = self.inner.write().await;
        if inner.by_username.contains_key(&record.username) {
            return Err(StoreError::Duplicate);
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            username: record.username.clone(),
            name: record.name.clone(),
            password_hash: record.password_hash.clone(),
            submissions: Vec::new(),
            version: 1,
            created_at: Utc::now(),
        };

        let index = inner.users.len();
        inner.by_id.insert(user.id, index);
        inner.by_username.insert(user.username.clone(), index);
        inner.users.push(user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.by_id.get(&user_id).map(|&i| inner.users[i].clone()))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_username
            .get(username)
            .map(|&i| inner.users[i].clone()))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn attach_submission(
        &self,
        user_id: UserId,
        submission: SubmissionId,
    ) -> StoreResult<Option<UserRecord>> {
        let mut inner = self.inner.write().await;
        let Some(&index) = inner.by_id.get(&user_id) else {
            return Ok(None);
        };

        let user = &mut inner.users[index];
        if !user.submissions.contains(&submission) {
            user.submissions.push(submission);
            user.version += 1;
        }

        Ok(Some(user.clone()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
