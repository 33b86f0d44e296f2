//! # Stockroom API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom API Server                             │
//! │                                                                         │
//! │  Client ───► HTTP (8080) ───► routes ───► services ───► SQLite          │
//! │                                                   (WAL, pool of 3)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockroom_api::{routes, ApiConfig, AppState};
use stockroom_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Stockroom API server...");

    // Optional config path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ApiConfig::load(config_path).context("Failed to load configuration")?;
    info!(
        port = config.port,
        database = %config.database_path.display(),
        max_connections = config.max_connections,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;

    let state = AppState::new(db.clone(), &config).context("Failed to set up credential store")?;
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
