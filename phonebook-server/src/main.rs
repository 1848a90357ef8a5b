//! phonebook-server - Contact management REST service
//!
//! Serves the contact API under `/api` and previously uploaded files under
//! `/files`, backed by an in-memory or SQLite contact repository.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use phonebook_common::db::init_database;
use phonebook_common::{ContactRepository, MemoryRepository, SqliteRepository};
use phonebook_server::config::{Args, Backend, Config};
use phonebook_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "phonebook_server=info,phonebook_common=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting phonebook-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::load(Args::parse()).context("Failed to load configuration")?;

    let contacts: Arc<dyn ContactRepository> = match config.backend {
        Backend::Memory => Arc::new(MemoryRepository::new()),
        Backend::Sqlite => {
            info!("Database path: {}", config.database_path.display());
            let pool = init_database(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            Arc::new(SqliteRepository::new(pool))
        }
    };
    info!("Using {} contact backend", contacts.backend());

    tokio::fs::create_dir_all(&config.files_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.files_dir.display()))?;
    info!("Serving uploads from {}", config.files_dir.display());

    let state = AppState::new(contacts, config.files_dir.clone(), config.max_upload_bytes);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("phonebook-server listening on http://{}", addr);

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
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
