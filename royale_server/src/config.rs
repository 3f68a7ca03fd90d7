//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Loaded once in `main`; nothing reads the environment after
//! startup.

use chrono::Duration as TokenDuration;
use royale::{
    auth::{AuthConfig, DEFAULT_CSRF_HEADER, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS},
    db::DatabaseConfig,
    user::{DEFAULT_MIN_PASSWORD_LENGTH, PasswordPolicy},
};
use std::net::SocketAddr;

/// Shortest password length the policy may be configured to
pub const MIN_CONFIGURABLE_PASSWORD_LENGTH: usize = 4;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Run against the in-process store instead of PostgreSQL
    pub in_memory: bool,
    /// Security configuration
    pub security: SecurityConfig,
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,
    /// Prometheus exporter address, if enabled
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Session token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Minimum accepted password length
    pub min_password_length: usize,
    /// Header carrying the CSRF token on mutating requests
    pub csrf_header: String,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("min_password_length", &self.min_password_length)
            .field("csrf_header", &self.csrf_header)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `in_memory` - Use the in-process store (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        in_memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(addr) => addr,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{}' is not a socket address", raw),
                })?,
                Err(_) => SocketAddr::from(([127, 0, 0, 1], 4000)),
            },
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            std::env::var("PASSWORD_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let security = SecurityConfig {
            jwt_secret,
            password_pepper,
            token_ttl_secs: parse_env_or("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
            min_password_length: parse_env_or("PASSWORD_MIN_LENGTH", DEFAULT_MIN_PASSWORD_LENGTH),
            csrf_header: std::env::var("CSRF_HEADER")
                .unwrap_or_else(|_| DEFAULT_CSRF_HEADER.to_string()),
            cookie_secure: parse_env_or("SESSION_COOKIE_SECURE", false),
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let metrics_bind = std::env::var("METRICS_BIND")
            .ok()
            .and_then(|v| v.parse().ok());

        let config = ServerConfig {
            bind,
            database,
            in_memory,
            security,
            cors_origins,
            metrics_bind,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.security.token_ttl_secs <= 0 || self.security.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_SECS".to_string(),
                reason: format!("Must be between 1 and {}", MAX_TOKEN_TTL_SECS),
            });
        }

        if self.security.min_password_length < MIN_CONFIGURABLE_PASSWORD_LENGTH {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_MIN_LENGTH".to_string(),
                reason: format!("Must be at least {}", MIN_CONFIGURABLE_PASSWORD_LENGTH),
            });
        }

        if axum::http::HeaderName::from_bytes(self.security.csrf_header.as_bytes()).is_err() {
            return Err(ConfigError::Invalid {
                var: "CSRF_HEADER".to_string(),
                reason: format!("'{}' is not a valid header name", self.security.csrf_header),
            });
        }

        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_QUERY_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Settings handed to the user service
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.security.jwt_secret.clone(),
            password_pepper: self.security.password_pepper.clone(),
            token_ttl: TokenDuration::seconds(
                self.security.token_ttl_secs.clamp(1, MAX_TOKEN_TTL_SECS),
            ),
            password_policy: PasswordPolicy {
                min_length: self.security.min_password_length,
            },
            store_timeout: self.database.query_timeout(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig::default(),
            in_memory: true,
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                password_pepper: "a".repeat(16),
                token_ttl_secs: 3600,
                min_password_length: 8,
                csrf_header: "X-CSRF-Token".to_string(),
                cookie_secure: false,
            },
            cors_origins: vec!["http://localhost:5173".to_string()],
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid_config();
        config.security.jwt_secret = "short".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_trivial_password_minimum_rejected() {
        let mut config = valid_config();
        config.security.min_password_length = 3;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "PASSWORD_MIN_LENGTH"));
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = valid_config();
        config.security.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());

        for ttl in [0, -1, MAX_TOKEN_TTL_SECS + 1, 9_000_000_000_000, i64::MAX] {
            config.security.token_ttl_secs = ttl;
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TOKEN_TTL_SECS"));
        }
    }

    #[test]
    fn test_auth_config_never_exceeds_max_ttl() {
        let mut config = valid_config();
        config.security.token_ttl_secs = i64::MAX;
        assert_eq!(config.auth_config().token_ttl.num_seconds(), MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_bad_csrf_header_rejected() {
        let mut config = valid_config();
        config.security.csrf_header = "X CSRF".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_config_mapping() {
        let config = valid_config();
        let auth = config.auth_config();
        assert_eq!(auth.token_ttl.num_seconds(), 3600);
        assert_eq!(auth.password_policy.min_length, 8);
        assert_eq!(auth.store_timeout, config.database.query_timeout());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", valid_config());
        assert!(!debug.contains(&"a".repeat(32)));
        assert!(debug.contains("<redacted>"));
    }
}
