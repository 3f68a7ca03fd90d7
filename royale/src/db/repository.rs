//! Credential store abstraction.
//!
//! [`UserRepository`] is the persistence boundary the user service talks to.
//! Implementations must make the username uniqueness check and the insert a
//! single atomic step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::errors::StoreResult;
use crate::user::{NewUserRecord, SubmissionId, UserId, UserRecord};

/// Trait for credential store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new record, assigning its id.
    ///
    /// Fails with `StoreError::Duplicate` if the username is taken; the store
    /// is left unchanged in that case.
    async fn create_user(&self, record: &NewUserRecord) -> StoreResult<UserRecord>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<UserRecord>>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    /// All users in creation order
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    /// Append a submission reference. Already-attached ids are not repeated.
    ///
    /// Returns `None` when the user does not exist.
    async fn attach_submission(
        &self,
        user_id: UserId,
        submission: SubmissionId,
    ) -> StoreResult<Option<UserRecord>>;

    /// Cheap connectivity probe
    async fn health_check(&self) -> StoreResult<()>;
}

const USER_COLUMNS: &str = "id, username, name, password_hash, submissions, version, created_at";

/// PostgreSQL implementation of `UserRepository`
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    let submissions: Vec<Uuid> = row.try_get("submissions")?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        submissions: submissions.into_iter().map(SubmissionId).collect(),
        version: row.try_get("version")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, record: &NewUserRecord) -> StoreResult<UserRecord> {
        // The unique index on username makes this insert the uniqueness check.
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&record.username)
        .bind(&record.name)
        .bind(&record.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row)?)
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_user).collect::<Result<_, _>>()?)
    }

    async fn attach_submission(
        &self,
        user_id: UserId,
        submission: SubmissionId,
    ) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET submissions = CASE
                    WHEN $2 = ANY(submissions) THEN submissions
                    ELSE array_append(submissions, $2)
                END,
                version = CASE
                    WHEN $2 = ANY(submissions) THEN version
                    ELSE version + 1
                END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(submission.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user).transpose()?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
