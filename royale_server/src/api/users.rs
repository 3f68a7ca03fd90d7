//! User directory handlers.
//!
//! Listing, lookup and signup are public. Attaching a submission requires a
//! session and the CSRF header, and only the owner may attach to a record.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use royale::{
    AuthError, UserView,
    auth::{SessionClaims, SignupRequest},
    user::{SubmissionId, UserId},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, error::ApiError};
use crate::metrics;

/// Body of `POST /api/users/{id}/submissions`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachSubmissionPayload {
    pub submission_id: Uuid,
}

/// List all users in creation order.
///
/// Returns `200 OK` with a JSON array of sanitized users; `[]` when none exist.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(Json(state.users.list_users().await?))
}

/// Register a new user.
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "name": "Alice A", "password": "longenoughpw" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field or password below the configured minimum
/// - `409 Conflict`: Username already taken
/// - `503 Service Unavailable`: Store unreachable or timed out
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let Json(request) = payload?;

    match state.users.signup(request).await {
        Ok(user) => {
            metrics::signups_total("created");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) => {
            metrics::signups_total(match e {
                AuthError::Validation(_) => "invalid",
                AuthError::UsernameTaken => "conflict",
                _ => "error",
            });
            Err(e.into())
        }
    }
}

/// Look up one user by id.
///
/// An id that is not a UUID cannot name any user and is reported as
/// `404 Not Found`, same as an unknown one.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let user_id = parse_user_id(&id)?;
    Ok(Json(state.users.get_user(user_id).await?))
}

/// Attach a submission reference to the caller's own record.
///
/// # Errors
///
/// - `403 Forbidden`: Record belongs to someone else
/// - `404 Not Found`: No such user
pub async fn attach_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<String>,
    payload: Result<Json<AttachSubmissionPayload>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let Json(payload) = payload?;

    let user = state
        .users
        .attach_submission(&claims, user_id, SubmissionId(payload.submission_id))
        .await?;
    tracing::info!(user_id = %user.id, submission = %payload.submission_id, "Submission attached");
    Ok(Json(user))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Auth(AuthError::UserNotFound))
}
