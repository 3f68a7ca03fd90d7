//! Prometheus metrics for the identity server.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener when
//! `METRICS_BIND` is set. Without an installed recorder every call below is a
//! no-op, so handlers record unconditionally.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use royale_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/login", 200);
//! metrics::login_attempts_total(true);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// `path` should be the matched route template, not the raw URI, to keep
/// label cardinality bounded.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Identity Metrics
// ============================================================================

/// Increment signups counter, labelled by outcome
/// (`created`, `invalid`, `conflict`, `error`).
pub fn signups_total(outcome: &str) {
    metrics::counter!("signups_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment CSRF rejections counter (`missing` or `mismatch`).
pub fn csrf_rejections_total(reason: &str) {
    metrics::counter!("csrf_rejections_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}
