//! Authentication data models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::{FieldSource, UserId, UserView};

/// User signup request.
///
/// Fields are optional so that a missing field surfaces as a validation
/// error naming it rather than a deserialization failure.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl SignupRequest {
    pub fn new(
        username: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            name: Some(name.into()),
            password: Some(password.into()),
        }
    }

    /// Username and name trimmed; password untouched
    pub(crate) fn into_parts(self) -> (String, String, String) {
        (
            self.username.unwrap_or_default().trim().to_string(),
            self.name.unwrap_or_default().trim().to_string(),
            self.password.unwrap_or_default(),
        )
    }
}

impl FieldSource for SignupRequest {
    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "username" => self.username.as_deref(),
            "name" => self.name.as_deref(),
            "password" => self.password.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// User login request
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// JWT claims for a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,           // User ID
    pub username: String,
    pub csrf: String,          // Hex SHA-256 of the companion CSRF token
    pub iat: i64,              // Issued at timestamp
    pub exp: i64,              // Expiration timestamp
}

/// Successful login: the sanitized user plus the token pair
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserView,
    pub session_token: String,
    pub csrf_token: String,
}
