//! Stateless session tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};

use super::{
    csrf::CsrfToken,
    errors::{AuthError, AuthResult},
    models::SessionClaims,
};
use crate::user::UserView;

/// Default session lifetime in seconds (one day)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Longest accepted session lifetime in seconds (365 days)
pub const MAX_TOKEN_TTL_SECS: i64 = 31_536_000;

/// Mints and verifies session tokens.
///
/// Validity depends only on the signature and `exp`; nothing is stored
/// server-side, so replacing the secret invalidates every outstanding token.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user`, bound to the given CSRF token
    pub fn issue(&self, user: &UserView, csrf: &CsrfToken) -> AuthResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::TokenLifetimeOutOfRange)?;
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            csrf: csrf.digest.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::TokenEncoding)
    }

    /// Check signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::csrf::CsrfGuard;
    use uuid::Uuid;

    const SECRET: &str = "test_secret_key_for_testing_only_0123456789";

    fn ttl() -> Duration {
        Duration::seconds(DEFAULT_TOKEN_TTL_SECS)
    }

    fn user() -> UserView {
        UserView {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            name: "Alice A".to_string(),
            submissions: Vec::new(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = SessionIssuer::new(SECRET, ttl());
        let user = user();
        let csrf = CsrfGuard::new().issue();

        let token = issuer.issue(&user, &csrf).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.csrf, csrf.digest);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = SessionIssuer::new(SECRET, Duration::minutes(-10));
        let token = issuer.issue(&user(), &CsrfGuard::new().issue()).unwrap();

        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let issuer = SessionIssuer::new(SECRET, Duration::seconds(9_000_000_000_000));
        let result = issuer.issue(&user(), &CsrfGuard::new().issue());

        assert!(matches!(result, Err(AuthError::TokenLifetimeOutOfRange)));
    }

    #[test]
    fn test_longest_accepted_lifetime_issues() {
        let issuer = SessionIssuer::new(SECRET, Duration::seconds(MAX_TOKEN_TTL_SECS));
        let token = issuer.issue(&user(), &CsrfGuard::new().issue()).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_rotated_secret_invalidates_tokens() {
        let old = SessionIssuer::new(SECRET, ttl());
        let new = SessionIssuer::new("another_secret_key_for_testing_only_98765", ttl());
        let token = old.issue(&user(), &CsrfGuard::new().issue()).unwrap();

        assert!(matches!(new.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = SessionIssuer::new(SECRET, ttl());
        let token = issuer.issue(&user(), &CsrfGuard::new().issue()).unwrap();

        // Swap the payload for another user's payload, keeping the signature
        let other = issuer.issue(&user(), &CsrfGuard::new().issue()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(issuer.verify(&forged), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify("garbage"), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify(""), Err(AuthError::InvalidToken)));
    }
}
