//! # Royale
//!
//! Identity and integrity core of the Royale hackathon-submission platform.
//!
//! Everything outside this crate (pages, routing, voting) reaches user data
//! through [`auth::UserService`], which guarantees:
//!
//! - records are never stored with a missing `username`, `name` or password hash
//! - usernames are unique, enforced atomically by the store
//! - password hashes never leave the crate: callers only see [`user::UserView`]
//! - sessions are signed and time-bounded; mutating requests must also echo
//!   the CSRF token issued with the session
//!
//! ## Core Modules
//!
//! - [`user`]: Credential record, sanitized view, declarative validation
//! - [`auth`]: Password hashing, session tokens, CSRF guard, user service
//! - [`db`]: Credential store trait with PostgreSQL and in-memory backends
//!
//! ## Example
//!
//! ```
//! use royale::user::{NewUserRecord, validate_record};
//!
//! let record = NewUserRecord {
//!     username: "alice".to_string(),
//!     name: String::new(),
//!     password_hash: "$argon2id$...".to_string(),
//! };
//! let err = validate_record(&record).unwrap_err();
//! assert_eq!(err.to_string(), "name is required");
//! ```

/// Authentication, sessions and the user service.
pub mod auth;

/// Credential store and database plumbing.
pub mod db;

/// Credential record and validation rules.
pub mod user;

pub use auth::{AuthConfig, AuthError, AuthResult, UserService};
pub use user::{UserRecord, UserView};
