//! User service: signup, login, lookup, and listing on top of the credential
//! store, password hasher, session issuer and CSRF guard.

use chrono::Duration as TokenDuration;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{
    csrf::CsrfGuard,
    errors::{AuthError, AuthResult},
    models::{LoginOutcome, LoginRequest, SessionClaims, SignupRequest},
    password::PasswordHasher,
    session::{DEFAULT_TOKEN_TTL_SECS, SessionIssuer},
};
use crate::db::{
    StoreError, StoreResult, UserRepository,
    timeouts::{DEFAULT_QUERY_TIMEOUT, with_timeout},
};
use crate::user::{
    NewUserRecord, PasswordPolicy, SubmissionId, UserId, UserView, evaluate, signup_rules,
    validate_record,
};

/// Settings the service needs, resolved once at startup
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret key for session token signing
    pub jwt_secret: String,
    /// Server-side pepper mixed into every password hash
    pub password_pepper: String,
    /// Session token lifetime
    pub token_ttl: TokenDuration,
    pub password_policy: PasswordPolicy,
    /// Upper bound on each store call
    pub store_timeout: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, password_pepper: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            password_pepper: password_pepper.into(),
            token_ttl: TokenDuration::seconds(DEFAULT_TOKEN_TTL_SECS),
            password_policy: PasswordPolicy::default(),
            store_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Orchestrates the identity layer.
///
/// Holds no mutable state of its own; conflicting writes are serialized by
/// the store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    sessions: SessionIssuer,
    csrf: CsrfGuard,
    policy: PasswordPolicy,
    store_timeout: Duration,
}

impl UserService {
    /// Create a new user service
    ///
    /// # Arguments
    ///
    /// * `store` - Credential store
    /// * `config` - Secrets, token lifetime, password policy and store timeout
    pub fn new(store: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self::from_parts(
            store,
            PasswordHasher::new(config.password_pepper.clone()),
            SessionIssuer::new(&config.jwt_secret, config.token_ttl),
            config.password_policy,
            config.store_timeout,
        )
    }

    /// Assemble from pre-built components
    pub fn from_parts(
        store: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        sessions: SessionIssuer,
        policy: PasswordPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
            csrf: CsrfGuard::new(),
            policy,
            store_timeout,
        }
    }

    pub fn session_ttl(&self) -> TokenDuration {
        self.sessions.ttl()
    }

    async fn bounded<T, F>(&self, future: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        with_timeout(self.store_timeout, future).await
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Missing field or password below policy, all violations listed
    /// * `AuthError::UsernameTaken` - Username already exists
    /// * `AuthError::Store` - Store unavailable or timed out
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<UserView> {
        evaluate(&signup_rules(&self.policy), &request)?;
        let (username, name, password) = request.into_parts();

        // Skip the hashing cost for an obvious duplicate; the insert below
        // still enforces uniqueness.
        if self
            .bounded(self.store.find_by_username(&username))
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let record = NewUserRecord {
            username,
            name,
            password_hash: self.hasher.hash_blocking(password).await?,
        };
        validate_record(&record)?;

        match self.bounded(self.store.create_user(&record)).await {
            Ok(user) => {
                log::info!("Registered user {} ({})", user.username, user.id);
                Ok(user.into())
            }
            Err(StoreError::Duplicate) => Err(AuthError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Login a user, issuing a session token and its companion CSRF token
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown username or wrong password
    /// * `AuthError::Store` - Store unavailable or timed out
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginOutcome> {
        let LoginRequest { username, password } = request;
        let user = self
            .bounded(self.store.find_by_username(username.trim()))
            .await?;

        let Some(user) = user else {
            self.hasher.verify_dummy_blocking(password).await;
            log::warn!("Login failed for unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify_blocking(password, user.password_hash.clone())
            .await
        {
            log::warn!("Login failed for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let user = UserView::from(user);
        let csrf = self.csrf.issue();
        let session_token = self.sessions.issue(&user, &csrf)?;

        log::info!("User {} logged in", user.id);
        Ok(LoginOutcome {
            user,
            session_token,
            csrf_token: csrf.token,
        })
    }

    /// All users, sanitized, in creation order
    pub async fn list_users(&self) -> AuthResult<Vec<UserView>> {
        let users = self.bounded(self.store.list_users()).await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    /// Look up one user
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No record with this id
    pub async fn get_user(&self, user_id: UserId) -> AuthResult<UserView> {
        self.bounded(self.store.find_by_id(user_id))
            .await?
            .map(UserView::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Attach a submission reference to the caller's own record
    ///
    /// # Errors
    ///
    /// * `AuthError::Forbidden` - `user_id` is not the authenticated user
    /// * `AuthError::UserNotFound` - No record with this id
    pub async fn attach_submission(
        &self,
        session: &SessionClaims,
        user_id: UserId,
        submission: SubmissionId,
    ) -> AuthResult<UserView> {
        if session.sub != user_id {
            return Err(AuthError::Forbidden);
        }

        self.bounded(self.store.attach_submission(user_id, submission))
            .await?
            .map(UserView::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Verify a session token
    pub fn verify_session(&self, token: &str) -> AuthResult<SessionClaims> {
        self.sessions.verify(token)
    }

    /// Check the CSRF header value presented alongside a verified session
    pub fn verify_csrf(&self, session: &SessionClaims, presented: Option<&str>) -> AuthResult<()> {
        self.csrf.verify(&session.csrf, presented)
    }

    /// Store connectivity probe
    pub async fn health_check(&self) -> AuthResult<()> {
        Ok(self.bounded(self.store.health_check()).await?)
    }
}
