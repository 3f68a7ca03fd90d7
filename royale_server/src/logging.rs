//! Structured logging configuration.
//!
//! Request correlation lives in [`crate::api::request_id`]; this module owns
//! subscriber setup and the shared event helpers.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with noisy
/// dependencies turned down. Records emitted through the `log` facade by the
/// core library are captured as well.
///
/// # Example
///
/// ```no_run
/// use royale_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `username` - Username involved, if known
/// * `request_id` - Correlation ID of the request
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use royale_server::logging::log_security_event;
///
/// log_security_event(
///     "csrf_mismatch",
///     Some("alice"),
///     Some("0b7c6a1e"),
///     "CSRF token did not match session"
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    username: Option<&str>,
    request_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        username = username,
        request_id = request_id,
        "SECURITY: {}",
        message
    );
}

/// Log API request/response
///
/// Slow requests (over one second) are raised to `warn`.
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    if duration_ms > 1000 {
        tracing::warn!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "Slow API request"
        );
    } else {
        tracing::info!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("test_event", Some("alice"), Some("req-1"), "Test message");
        log_security_event("test_event", None, None, "Anonymous");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("req-1", "GET", "/api/users", 200, 45);
        log_api_request("req-2", "POST", "/api/login", 401, 1200);
    }
}
