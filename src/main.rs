//! AudioGate Server: token-gated audio downloads.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use audiogate_access::{
    AccessValidator, DownloadService, ExpirationSweeper, TokenIssuer, TokenStore,
};
use audiogate_api::AppState;
use audiogate_core::config::AppConfig;
use audiogate_core::error::AppError;
use audiogate_core::traits::{Clock, StorageProvider, SystemClock};
use audiogate_media::{MediaFetcher, YtDlpFetcher};
use audiogate_storage::{LocalStorageProvider, OrphanPurge};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "audiogate-server", version, about = "Token-gated audio download server")]
struct Args {
    /// Directory holding default.toml and the environment overlays.
    #[arg(long, env = "AUDIOGATE_CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment overlay to apply on top of default.toml.
    #[arg(long, env = "AUDIOGATE_ENV", default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.config_dir, &args.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(config_dir = %args.config_dir, env = %args.env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AudioGate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Downloads directory ──────────────────────────────
    let storage: Arc<dyn StorageProvider> =
        Arc::new(LocalStorageProvider::new(&config.storage.downloads_dir).await?);
    tracing::info!(downloads_dir = %config.storage.downloads_dir, "Storage initialized");

    // ── Step 2: Purge files no token can reach ───────────────────
    if config.storage.purge_on_startup {
        OrphanPurge::new(Arc::clone(&storage)).purge_orphans().await?;
    }

    // ── Step 3: Access subsystem ─────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(TokenStore::new(config.access.ttl()));
    let issuer = Arc::new(TokenIssuer::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.access.token_bytes,
    )?);
    let validator = AccessValidator::new(Arc::clone(&store), Arc::clone(&clock))
        .with_single_use(config.access.single_use);
    let downloads = Arc::new(DownloadService::new(
        validator,
        Arc::clone(&store),
        Arc::clone(&storage),
    ));
    tracing::info!(
        ttl_seconds = config.access.ttl_seconds,
        token_bytes = config.access.token_bytes,
        single_use = config.access.single_use,
        "Access subsystem initialized"
    );

    // ── Step 4: Media fetcher ────────────────────────────────────
    let fetcher: Arc<dyn MediaFetcher> = Arc::new(YtDlpFetcher::new(
        config.media.clone(),
        &config.storage.downloads_dir,
    ));

    // ── Step 5: Shutdown channel & sweeper ───────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = Arc::new(ExpirationSweeper::new(
        Arc::clone(&store),
        Arc::clone(&storage),
        Arc::clone(&clock),
        config.access.sweep_interval(),
    ));
    let sweeper_handle = sweeper.spawn(shutdown_rx);

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app_state = AppState {
        config: Arc::new(config.clone()),
        store,
        issuer,
        downloads,
        fetcher,
        storage,
    };
    let app = audiogate_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("AudioGate server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 8: Wait for the sweeper ─────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, sweeper_handle).await.is_err() {
        tracing::warn!("Sweeper did not stop within the grace period");
    }

    tracing::info!("AudioGate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
