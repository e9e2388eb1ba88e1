//! cipa-server - CIPA governance service
//!
//! Serves NR-5 dimensioning, sick-leave risk, election calendar, candidate
//! registration with remote signature hand-off and document generation over
//! HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cipa_common::config::{ServiceConfig, TomlConfig};
use cipa_common::events::EventBus;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cipa_server::AppState;

/// Command-line arguments for cipa-server
#[derive(Parser, Debug)]
#[command(name = "cipa-server")]
#[command(about = "CIPA governance service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CIPA_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and signature files
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/cipa/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml = TomlConfig::load_or_default(args.config.as_deref());
    let config = ServiceConfig::resolve(args.root_folder.as_deref(), args.port, &toml);

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!(
                    "cipa_server={level},cipa_common={level},tower_http={level}",
                    level = config.log_level
                ))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting cipa-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());

    config
        .ensure_directories()
        .context("Failed to initialize root folder")?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db = cipa_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let expired = cipa_server::db::handoffs::expire_stale(&db, cipa_common::time::now()).await?;
    if expired > 0 {
        info!("Expired {} stale signature hand-off(s)", expired);
    }

    let event_bus = EventBus::new(100);
    let port = config.port;
    info!(
        "Signing links: {}/assinar/<token> (valid {} min)",
        config.public_base_url,
        config.handoff_ttl.num_minutes()
    );

    let state = AppState::new(db, event_bus, config).context("Failed to build application state")?;
    let app = cipa_server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
