//! Identity server for the Royale hackathon platform.
//!
//! Serves signup, login and the user directory over HTTP, backed by
//! PostgreSQL or, for local development, an in-process store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use axum::http::HeaderName;
use pico_args::Arguments;
use royale::{
    UserService,
    db::{Database, MemoryUserRepository, UserRepository},
};
use royale_server::{api, config::ServerConfig, logging, metrics};
use tracing::info;

const HELP: &str = "\
Run the Royale identity server

USAGE:
  royale_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:4000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --in-memory              Use an in-process store instead of PostgreSQL (data is lost on exit)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Session signing secret (required, 32+ chars)
  PASSWORD_PEPPER          Password hashing pepper (required, 16+ chars)
  TOKEN_TTL_SECS           Session lifetime in seconds [default: 86400]
  PASSWORD_MIN_LENGTH      Minimum password length [default: 8]
  CSRF_HEADER              CSRF header name [default: X-CSRF-Token]
  CORS_ORIGINS             Comma-separated allowed origins
  METRICS_BIND             Prometheus exporter address (disabled if unset)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let in_memory = pargs.contains("--in-memory");
    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url, in_memory)?;
    info!("Starting identity server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let mut database: Option<Database> = None;
    let store: Arc<dyn UserRepository> = if config.in_memory {
        tracing::warn!("Using in-memory store; all users are lost on shutdown");
        Arc::new(MemoryUserRepository::new())
    } else {
        let db = Database::new(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
        db.migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        info!("Database connected and migrated");
        let repository = Arc::new(db.user_repository());
        database = Some(db);
        repository
    };

    let users = Arc::new(UserService::new(store, &config.auth_config()));
    let csrf_header = HeaderName::from_bytes(config.security.csrf_header.as_bytes())?;
    let state = api::AppState::new(users, csrf_header, config.security.cookie_secure);

    let app = api::create_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
