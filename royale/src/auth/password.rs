//! Argon2id password hashing with a server-side pepper.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use std::sync::{Arc, OnceLock};

use super::errors::{AuthError, AuthResult};

const DUMMY_PASSWORD: &str = "royale-dummy-password";

/// One-way password hasher.
///
/// Hashes are PHC strings carrying their own salt and parameters, so a hash
/// produced with one parameter set still verifies after the defaults change.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    pepper: String,
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    /// Argon2id with the crate's default cost parameters
    pub fn new(pepper: impl Into<String>) -> Self {
        Self::with_params(pepper, Params::default())
    }

    /// Argon2id with explicit cost parameters
    pub fn with_params(pepper: impl Into<String>, params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            pepper: pepper.into(),
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// The derived output is compared in constant time. A stored value that
    /// does not parse as a PHC string never verifies.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        let peppered = format!("{}{}", password, self.pepper);

        self.argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Burn one verification against a throwaway hash.
    ///
    /// Called when the username does not exist so that the response time
    /// matches a wrong-password attempt.
    ///
    /// The dummy hash is cached only once it has been computed; a failed
    /// attempt is retried on the next call.
    pub fn verify_dummy(&self, password: &str) {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => match self.hash(DUMMY_PASSWORD) {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash),
                Err(e) => {
                    log::error!("Failed to compute dummy password hash: {}", e);
                    return;
                }
            },
        };
        let _ = self.verify(password, hash);
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_blocking(&self, password: String) -> AuthResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                log::error!("Password hashing task failed: {}", e);
                AuthError::HashingFailed
            })?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn verify_blocking(&self, password: String, hash: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or_else(|e| {
                log::error!("Password verification task failed: {}", e);
                false
            })
    }

    /// [`verify_dummy`](Self::verify_dummy) on the blocking thread pool
    pub async fn verify_dummy_blocking(&self, password: String) {
        let hasher = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await {
            log::error!("Dummy verification task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher(pepper: &str) -> PasswordHasher {
        let params = Params::new(1024, 1, 1, None).unwrap();
        PasswordHasher::with_params(pepper, params)
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = fast_hasher("pepper");
        let hash = hasher.hash("longenoughpw").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("longenoughpw"));
        assert!(hasher.verify("longenoughpw", &hash));
        assert!(!hasher.verify("longenoughpx", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = fast_hasher("pepper");
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same-password", &a));
        assert!(hasher.verify("same-password", &b));
    }

    #[test]
    fn test_pepper_is_part_of_the_hash() {
        let hash = fast_hasher("pepper-one").hash("password123").unwrap();
        assert!(!fast_hasher("pepper-two").verify("password123", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = fast_hasher("pepper");
        assert!(!hasher.verify("password123", "not-a-phc-string"));
        assert!(!hasher.verify("password123", ""));
    }

    #[test]
    fn test_dummy_verification_does_not_panic() {
        let hasher = fast_hasher("pepper");
        hasher.verify_dummy("whatever");
        hasher.verify_dummy("again");
        assert!(hasher.dummy_hash.get().is_some());
    }

    #[test]
    fn test_cached_dummy_hash_is_a_real_hash() {
        let hasher = fast_hasher("pepper");
        hasher.verify_dummy("whatever");

        let cached = hasher.dummy_hash.get().unwrap();
        assert!(cached.starts_with("$argon2id$"));
        assert!(PasswordHash::new(cached).is_ok());
        assert!(hasher.verify(DUMMY_PASSWORD, cached));
    }

    #[test]
    fn test_clones_share_the_dummy_hash() {
        let hasher = fast_hasher("pepper");
        let clone = hasher.clone();
        clone.verify_dummy("whatever");
        assert_eq!(hasher.dummy_hash.get(), clone.dummy_hash.get());
    }

    #[tokio::test]
    async fn test_blocking_variants_match_inline() {
        let hasher = fast_hasher("pepper");
        let hash = hasher.hash_blocking("longenoughpw".to_string()).await.unwrap();

        assert!(hasher.verify("longenoughpw", &hash));
        assert!(hasher.verify_blocking("longenoughpw".to_string(), hash.clone()).await);
        assert!(!hasher.verify_blocking("wrongpassword".to_string(), hash).await);

        hasher.verify_dummy_blocking("whatever".to_string()).await;
        assert!(hasher.dummy_hash.get().is_some());
    }
}
