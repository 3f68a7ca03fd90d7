//! Session handlers: login, current user, logout.
//!
//! Login returns the session token and its CSRF token in the body and also
//! sets the session as an `HttpOnly` cookie. Browser clients keep the CSRF
//! token in memory and echo it in the CSRF header on every mutating request.
//!
//! ```bash
//! curl -X POST http://localhost:4000/api/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "longenoughpw"}'
//! ```

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use royale::{
    AuthError, UserView,
    auth::{LoginRequest, SessionClaims},
};
use serde::Serialize;

use super::{AppState, SESSION_COOKIE, error::ApiError, request_id::RequestId};
use crate::{logging, metrics};

/// Body returned by a successful login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub csrf_token: String,
    pub user: UserView,
}

/// Authenticate with username and password.
///
/// # Response
///
/// `200 OK` with `{ "token": "...", "csrfToken": "...", "user": {...} }` and a
/// `Set-Cookie` header carrying the session.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password (same body for both)
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let username = request.username.clone();

    match state.users.login(request).await {
        Ok(outcome) => {
            metrics::login_attempts_total(true);
            let cookie = session_cookie(
                &outcome.session_token,
                state.users.session_ttl().num_seconds(),
                state.cookie_secure,
            );
            let body = LoginResponse {
                token: outcome.session_token,
                csrf_token: outcome.csrf_token,
                user: outcome.user,
            };
            Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
        }
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                metrics::login_attempts_total(false);
                logging::log_security_event(
                    "failed_login",
                    Some(username.trim()),
                    Some(request_id.as_str()),
                    "Invalid credentials",
                );
            }
            Err(e.into())
        }
    }
}

/// The user behind the presented session.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(state.users.get_user(claims.sub).await?))
}

/// Clear the session cookie.
///
/// Session tokens are stateless, so a token copied elsewhere stays valid
/// until it expires.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> impl IntoResponse {
    tracing::info!(user_id = %claims.sub, "User logged out");
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, session_cookie("", 0, state.cookie_secure))],
    )
}

/// `Set-Cookie` value for the session; `max_age` of 0 expires it.
pub fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 3600, false);
        assert!(cookie.starts_with("royale_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("abc", 3600, true).ends_with("; Secure"));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = session_cookie("", 0, false);
        assert!(cookie.starts_with("royale_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_login_response_field_names() {
        let body = LoginResponse {
            token: "t".to_string(),
            csrf_token: "c".to_string(),
            user: UserView {
                id: uuid::Uuid::new_v4(),
                username: "alice".to_string(),
                name: "Alice".to_string(),
                submissions: Vec::new(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["token"], "t");
        assert_eq!(json["csrfToken"], "c");
        assert_eq!(json["user"]["username"], "alice");
    }
}
