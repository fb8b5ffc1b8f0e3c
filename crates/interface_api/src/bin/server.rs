//! Invoicing API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin invoicing-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin invoicing-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` / `API_DB_MIN_CONNECTIONS` - Pool bounds (default: 10 / 2)
//! * `API_RUN_MIGRATIONS` - Apply the embedded schema on startup (default: true)
//! * `API_EVENT_BUS_CAPACITY` - Buffered invoice events per subscriber (default: 1024)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_invoice::{BroadcastEventBus, InvoiceEvent, InvoiceUserApi};
use infra_db::{create_pool, run_migrations, PostgresInvoiceDao};
use interface_api::{config::ApiConfig, create_router, AppState};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting invoicing API server"
    );

    let pool = create_pool(config.database_config())
        .await
        .context("failed to connect to the database")?;

    if config.run_migrations {
        run_migrations(&pool).await.context("failed to apply migrations")?;
    }

    let bus = BroadcastEventBus::new(config.event_bus_capacity);
    tokio::spawn(log_invoice_events(bus.subscribe()));

    let dao = Arc::new(PostgresInvoiceDao::new(pool, Arc::new(bus)));
    let state = AppState::new(InvoiceUserApi::new(dao.clone()), dao, config.clone());
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Logs invoice creation events until the bus is dropped.
async fn log_invoice_events(mut events: broadcast::Receiver<InvoiceEvent>) {
    loop {
        match events.recv().await {
            Ok(InvoiceEvent::InvoiceCreated(notification)) => {
                tracing::info!(
                    invoice_id = %notification.invoice_id,
                    account_id = %notification.account_id,
                    balance = %notification.balance,
                    "Invoice created event"
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Invoice event listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
