//! Hiring Engine - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin hiring-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE__URL=postgres://... cargo run --bin hiring-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_WEBHOOK_SECRET` - Shared secret expected on payment webhooks
//! * `API_DATABASE__URL` - PostgreSQL connection string
//! * `API_ENGINE__REQUOTE_LIMIT`, `API_ENGINE__MAX_SUBMISSION_ATTEMPTS`, ... - Engine settings
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        requote_limit = config.engine.requote_limit,
        "Starting hiring engine API server"
    );

    let pool = create_pool(config.database.clone())
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let addr: SocketAddr = config.server_addr().parse().context("parsing bind address")?;
    let app = create_router(AppState::postgres(pool, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over `log_level`
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
