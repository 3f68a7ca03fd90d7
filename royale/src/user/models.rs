//! Credential record and its externally visible projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User ID type
pub type UserId = Uuid;

/// Reference to a submission owned by the external submission subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored user record, including the password hash.
///
/// Deliberately not `Serialize`: the only way out of the crate boundary is
/// through [`UserView`].
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub submissions: Vec<SubmissionId>,
    /// Internal revision counter, bumped on every change
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("submissions", &self.submissions)
            .field("version", &self.version)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Candidate record handed to the store. The store assigns `id`, `version`
/// and `created_at`.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub username: String,
    pub name: String,
    pub password_hash: String,
}

impl fmt::Debug for NewUserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserRecord")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Sanitized view of a user, safe for API responses and logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub submissions: Vec<SubmissionId>,
}

impl From<&UserRecord> for UserView {
    fn from(record: &UserRecord) -> Self {
        UserView {
            id: record.id,
            username: record.username.clone(),
            name: record.name.clone(),
            submissions: record.submissions.clone(),
        }
    }
}

impl From<UserRecord> for UserView {
    fn from(record: UserRecord) -> Self {
        UserView {
            id: record.id,
            username: record.username,
            name: record.name,
            submissions: record.submissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            name: "Alice A".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            submissions: vec![SubmissionId(Uuid::new_v4())],
            version: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_has_only_public_fields() {
        let record = record();
        let json = serde_json::to_value(UserView::from(&record)).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["id", "name", "submissions", "username"]);
        assert_eq!(obj["id"], record.id.to_string());
        assert_eq!(obj["submissions"][0], record.submissions[0].to_string());
    }

    #[test]
    fn test_owned_and_borrowed_views_match() {
        let record = record();
        assert_eq!(UserView::from(&record), UserView::from(record.clone()));
    }

    #[test]
    fn test_debug_redacts_password_hash() {
        let record = record();
        let debug = format!("{:?}", record);
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("<redacted>"));

        let new_record = NewUserRecord {
            username: "bob".to_string(),
            name: "Bob".to_string(),
            password_hash: "secret-hash".to_string(),
        };
        assert!(!format!("{:?}", new_record).contains("secret-hash"));
    }
}
