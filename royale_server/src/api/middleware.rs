//! Session and CSRF middleware for protected endpoints.
//!
//! [`session_middleware`] verifies the session token and injects the
//! [`SessionClaims`] into request extensions. [`csrf_middleware`] runs after
//! it and rejects mutating requests whose CSRF header does not match the
//! session.
//!
//! # Usage
//!
//! Layers run outermost-last, so the session layer is added after the CSRF
//! layer. `route_layer` keeps unmatched paths answering `404`:
//!
//! ```rust,no_run
//! use axum::{Router, routing::post, middleware};
//! # use royale_server::api::middleware::{csrf_middleware, session_middleware};
//! # use royale_server::api::AppState;
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let protected: Router<AppState> = Router::new()
//!     .route("/api/logout", post(handler))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), csrf_middleware))
//!     .route_layer(middleware::from_fn_with_state(state, session_middleware));
//! # let _ = protected;
//! ```

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, Method,
        header::{AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::Response,
};
use royale::{AuthError, auth::SessionClaims};

use super::{AppState, SESSION_COOKIE, error::ApiError, request_id::RequestId};
use crate::{logging, metrics};

/// Session token from `Authorization: Bearer` or the session cookie.
///
/// The header wins when both are present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, token)| token)
            .filter(|token| !token.is_empty())
    })
}

/// Authenticate the request and inject `SessionClaims`.
///
/// - **Success**: claims inserted into extensions, next handler runs
/// - **No token**: `401 Unauthorized`
/// - **Invalid/expired token**: `401 Unauthorized`
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers()).ok_or(ApiError::Unauthenticated)?;

    match state.users.verify_session(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            Err(e.into())
        }
    }
}

/// Enforce the CSRF header on mutating requests.
///
/// Safe methods pass through. Everything else must carry the configured
/// header with the token issued alongside the session.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_safe_method(request.method()) {
        return Ok(next.run(request).await);
    }

    let claims = request
        .extensions()
        .get::<SessionClaims>()
        .ok_or(ApiError::Unauthenticated)?;

    let presented = request
        .headers()
        .get(&state.csrf_header)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = state.users.verify_csrf(claims, presented) {
        let reason = match e {
            AuthError::CsrfMissing => "missing",
            _ => "mismatch",
        };
        metrics::csrf_rejections_total(reason);
        logging::log_security_event(
            &format!("csrf_{}", reason),
            Some(&claims.username),
            request.extensions().get::<RequestId>().map(RequestId::as_str),
            &format!("{} {} rejected", request.method(), request.uri().path()),
        );
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}
