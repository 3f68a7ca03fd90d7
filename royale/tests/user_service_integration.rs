//! Integration tests for the user service.
//!
//! Tests signup, login, listing, lookup and concurrent duplicate signups
//! against the in-memory credential store.

use argon2::Params;
use chrono::Duration as TokenDuration;
use royale::auth::{
    AuthError, LoginRequest, PasswordHasher, SessionIssuer, SignupRequest, UserService,
};
use royale::db::{MemoryUserRepository, UserRepository};
use royale::user::PasswordPolicy;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const JWT_SECRET: &str = "test_secret_key_for_testing_only_0123456789";

/// Helper to create a service over a fresh memory store
fn setup_service() -> (Arc<UserService>, Arc<MemoryUserRepository>) {
    let store = Arc::new(MemoryUserRepository::new());
    let params = Params::new(1024, 1, 1, None).expect("valid argon2 params");
    let service = UserService::from_parts(
        store.clone(),
        PasswordHasher::with_params("test_pepper_for_testing_only", params),
        SessionIssuer::new(JWT_SECRET, TokenDuration::hours(1)),
        PasswordPolicy::default(),
        Duration::from_secs(5),
    );
    (Arc::new(service), store)
}

#[tokio::test]
async fn test_alice_scenario() {
    let (service, _) = setup_service();

    let alice = service
        .signup(SignupRequest::new("alice", "Alice A", "longenoughpw"))
        .await
        .expect("Signup should succeed");
    assert_eq!(alice.username, "alice");

    let users = service.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "alice");

    let result = service
        .signup(SignupRequest::new("alice", "Alice Again", "longenoughpw"))
        .await;
    assert!(matches!(result, Err(AuthError::UsernameTaken)));

    let users = service.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0], alice);
}

#[tokio::test]
async fn test_missing_fields_leave_store_unchanged() {
    let (service, store) = setup_service();

    let cases = [
        (SignupRequest { username: None, ..SignupRequest::new("", "Name", "longenoughpw") }, "username"),
        (SignupRequest { name: None, ..SignupRequest::new("user1", "", "longenoughpw") }, "name"),
        (SignupRequest { password: None, ..SignupRequest::new("user2", "Name", "") }, "password"),
    ];

    for (request, field) in cases {
        match service.signup(request).await {
            Err(AuthError::Validation(errors)) => {
                assert!(errors.has_field(field), "violation should name {}", field);
                assert_eq!(errors.violations().len(), 1);
            }
            other => panic!("expected validation error for {}, got {:?}", field, other),
        }
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_password_policy_is_configurable() {
    let store = Arc::new(MemoryUserRepository::new());
    let params = Params::new(1024, 1, 1, None).unwrap();
    let service = UserService::from_parts(
        store.clone(),
        PasswordHasher::with_params("pepper", params),
        SessionIssuer::new(JWT_SECRET, TokenDuration::hours(1)),
        PasswordPolicy { min_length: 12 },
        Duration::from_secs(5),
    );

    let err = service
        .signup(SignupRequest::new("short", "Short", "elevenchars"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Password"));
    assert!(err.to_string().contains("12"));

    service
        .signup(SignupRequest::new("long", "Long", "twelve_chars"))
        .await
        .expect("12 characters meets a 12 character minimum");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_signups() {
    let (service, store) = setup_service();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .signup(SignupRequest::new("racer", format!("Racer {}", i), "longenoughpw"))
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::UsernameTaken) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(successes, 1, "exactly one signup should win");
    assert_eq!(store.len().await, 1);
    assert!(store.find_by_username("racer").await.unwrap().is_some());
}

#[tokio::test]
async fn test_repeated_lookup_is_stable() {
    let (service, _) = setup_service();
    let user = service
        .signup(SignupRequest::new("stable", "Stable", "longenoughpw"))
        .await
        .unwrap();

    let first = service.get_user(user.id).await.unwrap();
    let second = service.get_user(user.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, user);
}

#[tokio::test]
async fn test_never_created_id_is_not_found() {
    let (service, _) = setup_service();
    service
        .signup(SignupRequest::new("someone", "Someone", "longenoughpw"))
        .await
        .unwrap();

    let result = service.get_user(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn test_login_then_restore_session() {
    let (service, _) = setup_service();
    let user = service
        .signup(SignupRequest::new("restorer", "Restorer", "longenoughpw"))
        .await
        .unwrap();

    let login = service
        .login(LoginRequest::new("restorer", "longenoughpw"))
        .await
        .expect("Login should succeed");
    assert_eq!(login.user, user);
    assert!(!login.session_token.is_empty());
    assert!(!login.csrf_token.is_empty());

    let claims = service.verify_session(&login.session_token).unwrap();
    assert_eq!(service.get_user(claims.sub).await.unwrap(), user);

    // A second login mints an unrelated CSRF token
    let again = service
        .login(LoginRequest::new("restorer", "longenoughpw"))
        .await
        .unwrap();
    assert_ne!(again.csrf_token, login.csrf_token);
    assert!(matches!(
        service.verify_csrf(&claims, Some(&again.csrf_token)),
        Err(AuthError::CsrfMismatch)
    ));
}
