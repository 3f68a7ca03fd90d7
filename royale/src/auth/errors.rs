//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::user::ValidationErrors;

/// Authentication and user service errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more fields failed validation
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Session token missing, malformed, or signed with another key
    #[error("Invalid session token")]
    InvalidToken,

    /// Session token past its expiry
    #[error("Session expired")]
    TokenExpired,

    /// Mutating request without the CSRF header
    #[error("Missing CSRF token")]
    CsrfMissing,

    /// CSRF header does not match the session
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Authenticated, but not allowed to touch this resource
    #[error("Forbidden")]
    Forbidden,

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Expiry does not fit in a timestamp
    #[error("Session lifetime out of range")]
    TokenLifetimeOutOfRange,

    /// JWT encoding failed
    #[error("Token encoding failed: {0}")]
    TokenEncoding(jsonwebtoken::errors::Error),

    /// Credential store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store and token internals are replaced with generic text; token
    /// failures all read the same so clients cannot probe which check failed.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Store(e) if e.is_transient() => {
                "Service temporarily unavailable".to_string()
            }
            AuthError::Store(_)
            | AuthError::HashingFailed
            | AuthError::TokenLifetimeOutOfRange
            | AuthError::TokenEncoding(_) => {
                "Internal server error".to_string()
            }
            AuthError::InvalidToken | AuthError::TokenExpired => {
                "Authentication failed".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Only transient store failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Store(e) if e.is_transient())
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_store_errors_are_sanitized() {
        let err = AuthError::Store(StoreError::Unavailable("connection refused 10.0.0.5".into()));
        assert_eq!(err.client_message(), "Service temporarily unavailable");
        assert!(err.is_retryable());

        let err = AuthError::Store(StoreError::Database(sqlx::Error::RowNotFound));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_token_errors_share_message() {
        assert_eq!(
            AuthError::InvalidToken.client_message(),
            AuthError::TokenExpired.client_message()
        );
    }

    #[test]
    fn test_domain_errors_not_retryable() {
        assert!(!AuthError::UsernameTaken.is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
        assert!(AuthError::Store(StoreError::Timeout(Duration::from_secs(5))).is_retryable());
    }
}
