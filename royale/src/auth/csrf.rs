//! Double-submit CSRF tokens.
//!
//! At login the client receives a random token it keeps in same-origin
//! storage. The session token carries only the SHA-256 digest of it, so a
//! forged cross-origin request riding on the session cookie cannot produce
//! the matching header value.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Random bytes per token (hex-encoded to twice this length)
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Header clients echo the token in unless configured otherwise
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-Token";

/// Freshly issued token and the digest bound into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub token: String,
    pub digest: String,
}

/// Issues and checks CSRF tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfGuard;

impl CsrfGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn issue(&self) -> CsrfToken {
        let mut bytes = [0u8; CSRF_TOKEN_BYTES];
        rand::rng().fill(&mut bytes);
        let token = hex::encode(bytes);
        let digest = Self::digest(&token);
        CsrfToken { token, digest }
    }

    /// Hex SHA-256 of a token
    pub fn digest(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Compare the echoed header value with the session-bound digest
    pub fn verify(&self, expected_digest: &str, presented: Option<&str>) -> AuthResult<()> {
        let presented = presented
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::CsrfMissing)?;

        let actual = Self::digest(presented);
        if bool::from(actual.as_bytes().ct_eq(expected_digest.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::CsrfMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_shape() {
        let token = CsrfGuard::new().issue();
        assert_eq!(token.token.len(), CSRF_TOKEN_BYTES * 2);
        assert!(token.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token.digest, CsrfGuard::digest(&token.token));
        assert_ne!(token.digest, token.token);
    }

    #[test]
    fn test_tokens_are_unique() {
        let guard = CsrfGuard::new();
        assert_ne!(guard.issue().token, guard.issue().token);
    }

    #[test]
    fn test_matching_token_accepted() {
        let guard = CsrfGuard::new();
        let token = guard.issue();
        assert!(guard.verify(&token.digest, Some(&token.token)).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let guard = CsrfGuard::new();
        let token = guard.issue();
        assert!(matches!(
            guard.verify(&token.digest, None),
            Err(AuthError::CsrfMissing)
        ));
        assert!(matches!(
            guard.verify(&token.digest, Some("  ")),
            Err(AuthError::CsrfMissing)
        ));
    }

    #[test]
    fn test_mismatched_token_rejected() {
        let guard = CsrfGuard::new();
        let token = guard.issue();
        let other = guard.issue();
        assert!(matches!(
            guard.verify(&token.digest, Some(&other.token)),
            Err(AuthError::CsrfMismatch)
        ));
        // Presenting the digest itself is not the token
        assert!(matches!(
            guard.verify(&token.digest, Some(&token.digest)),
            Err(AuthError::CsrfMismatch)
        ));
    }
}
