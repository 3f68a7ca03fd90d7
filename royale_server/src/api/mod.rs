//! HTTP API for the identity server.
//!
//! # Modules
//!
//! - [`users`]: User directory (list, lookup, signup, submissions)
//! - [`auth`]: Session handlers (login, current user, logout)
//! - [`middleware`]: Session and CSRF middleware for protected endpoints
//! - [`error`]: Translation of service errors into responses
//! - [`request_id`]: Request correlation, request logging and HTTP metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                          - Health check (public)
//! GET  /api/users                       - List users (public)
//! POST /api/users                       - Sign up (public)
//! GET  /api/users/{id}                  - Get user (public)
//! POST /api/login                       - Login (public)
//! GET  /api/me                          - Current user (session)
//! POST /api/logout                      - Clear session cookie (session + CSRF)
//! POST /api/users/{id}/submissions      - Attach submission (session + CSRF)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use royale::{AuthConfig, UserService, db::MemoryUserRepository};
//! use royale_server::api::{AppState, create_router};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let config = AuthConfig::new("a-secret-of-at-least-thirty-two-chars", "a-pepper-value-16");
//! let users = UserService::new(Arc::new(MemoryUserRepository::new()), &config);
//! let state = AppState::new(Arc::new(users), "X-CSRF-Token".parse()?, false);
//!
//! let app = create_router(state, &["http://localhost:5173".to_string()]);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Json},
    routing::{get, post},
};
use royale::UserService;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "royale_session";

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to the Arc wrapper).
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    /// Header checked by the CSRF middleware
    pub csrf_header: HeaderName,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(users: Arc<UserService>, csrf_header: HeaderName, cookie_secure: bool) -> Self {
        Self {
            users,
            csrf_header,
            cookie_secure,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// `cors_origins` lists the origins allowed to make credentialed requests;
/// an empty list disables cross-origin access.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let cors = cors_layer(cors_origins, &state.csrf_header);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/login", post(auth::login));

    // Protected routes: session first, then CSRF on mutating methods
    let protected_routes = Router::new()
        .route("/api/me", get(auth::me))
        .route("/api/logout", post(auth::logout))
        .route("/api/users/{id}/submissions", post(users::attach_submission))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::csrf_middleware,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String], csrf_header: &HeaderName) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, csrf_header.clone()])
        .expose_headers([HeaderName::from_static(request_id::REQUEST_ID_HEADER)])
        .allow_credentials(true)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the credential store answers within the query
/// timeout, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:4000/health
/// # {"status":"healthy","version":"0.3.0","store":true,"timestamp":"2026-03-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.users.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
