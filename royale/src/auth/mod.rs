//! Authentication module providing signup, login, and session protection.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - Stateless HS256 session tokens carrying the user id and username
//! - Double-submit CSRF tokens bound to the session by digest
//! - Generic credential errors that never reveal which part was wrong
//!
//! ## Example
//!
//! ```no_run
//! use royale::auth::{AuthConfig, LoginRequest, SignupRequest, UserService};
//! use royale::db::{Database, DatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let config = AuthConfig::new("jwt_secret", "secret_pepper");
//!     let users = UserService::new(Arc::new(db.user_repository()), &config);
//!
//!     let user = users
//!         .signup(SignupRequest::new("alice", "Alice A", "longenoughpw"))
//!         .await?;
//!     println!("Registered user: {}", user.username);
//!
//!     let login = users.login(LoginRequest::new("alice", "longenoughpw")).await?;
//!     println!("Session: {}, CSRF: {}", login.session_token, login.csrf_token);
//!     Ok(())
//! }
//! ```

pub mod csrf;
pub mod errors;
pub mod models;
pub mod password;
pub mod service;
pub mod session;

pub use csrf::{CsrfGuard, CsrfToken, DEFAULT_CSRF_HEADER};
pub use errors::{AuthError, AuthResult};
pub use models::{LoginOutcome, LoginRequest, SessionClaims, SignupRequest};
pub use password::PasswordHasher;
pub use service::{AuthConfig, UserService};
pub use session::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, SessionIssuer};
