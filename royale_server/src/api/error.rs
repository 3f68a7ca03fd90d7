//! Translation of service errors into HTTP responses.
//!
//! Every handler returns `Result<_, ApiError>`; the status code and the
//! client-facing body are decided here and nowhere else.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use royale::{AuthError, user::FieldError};
use serde::Serialize;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// Error returned by API handlers and middleware
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by the user service
    Auth(AuthError),
    /// Request body could not be parsed
    BadRequest(String),
    /// Protected route reached without a session
    Unauthenticated,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Auth(err) => match err {
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::UsernameTaken => StatusCode::CONFLICT,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::CsrfMissing | AuthError::CsrfMismatch | AuthError::Forbidden => {
                    StatusCode::FORBIDDEN
                }
                AuthError::Store(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
                AuthError::Store(_)
                | AuthError::HashingFailed
                | AuthError::TokenLifetimeOutOfRange
                | AuthError::TokenEncoding(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Auth(AuthError::Validation(errors)) => ErrorResponse {
                error: errors.summary(),
                details: errors.field_errors(),
            },
            ApiError::Auth(err) => ErrorResponse {
                error: err.client_message(),
                details: Vec::new(),
            },
            ApiError::BadRequest(reason) => ErrorResponse {
                error: reason.clone(),
                details: Vec::new(),
            },
            ApiError::Unauthenticated => ErrorResponse {
                error: "Authentication required".to_string(),
                details: Vec::new(),
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // Full detail stays in the logs; the client gets the sanitized body
            if let ApiError::Auth(err) = &self {
                tracing::error!(error = %err, retryable = err.is_retryable(), "Request failed");
            }
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use royale::db::StoreError;
    use royale::user::{NewUserRecord, validate_record};
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::UsernameTaken, StatusCode::CONFLICT),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::CsrfMissing, StatusCode::FORBIDDEN),
            (AuthError::CsrfMismatch, StatusCode::FORBIDDEN),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::HashingFailed, StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::TokenLifetimeOutOfRange, StatusCode::INTERNAL_SERVER_ERROR),
            (
                AuthError::Store(StoreError::Timeout(Duration::from_secs(5))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let record = NewUserRecord {
            username: String::new(),
            name: String::new(),
            password_hash: "hash".to_string(),
        };
        let err = ApiError::from(AuthError::from(validate_record(&record).unwrap_err()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = err.body();
        assert!(body.error.contains("username"));
        assert_eq!(body.details.len(), 2);
    }

    #[test]
    fn test_store_detail_not_exposed() {
        let err = ApiError::from(AuthError::Store(StoreError::Unavailable(
            "connection refused 10.0.0.5:5432".to_string(),
        )));
        let body = serde_json::to_string(&err.body()).unwrap();
        assert!(!body.contains("10.0.0.5"));
        assert!(!body.contains("details"));
    }
}
