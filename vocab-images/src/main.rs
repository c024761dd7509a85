//! vocab-images - Vocabulary Image Microservice
//!
//! Resolves one illustrative image per vocabulary word for the flashcard
//! client: cache → generation → provider search with LLM ranking →
//! curated fallback.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use vocab_common::config::{load_toml_config, write_toml_config, ConfigFileResolver};

use vocab_images::logging;
use vocab_images::services::ImageCache;
use vocab_images::AppState;

/// Command-line arguments for vocab-images
#[derive(Parser, Debug)]
#[command(name = "vocab-images")]
#[command(about = "Image sourcing microservice for vocabulary flashcards")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides TOML)
    #[arg(short, long, env = "VOCAB_IMAGES_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides TOML)
    #[arg(short, long, env = "VOCAB_IMAGES_BIND")]
    bind: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config (file + CLI overrides) to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = logging::init_tracing();

    let config_path = ConfigFileResolver::new("vocab-images").resolve(args.config.as_deref());
    let mut config = load_toml_config(config_path.as_deref()).context("Failed to load config")?;

    if std::env::var_os("RUST_LOG").is_none() {
        logging::set_level(&log_filter, &config.logging.level)
            .context("Failed to apply configured log level")?;
    }

    info!("Starting vocab-images (Vocabulary Image) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: built-in defaults"),
    }

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    if let Some(path) = args.write_config {
        write_toml_config(&config, &path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!("Wrote config to {}", path.display());
        return Ok(());
    }

    let cache = Arc::new(ImageCache::new());
    let pipeline = vocab_images::config::build_pipeline(&config, cache)
        .context("Failed to build image pipeline")?;

    let state = AppState::new(pipeline);
    let app = vocab_images::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
            info!("Received SIGTERM, shutting down");
        },
    }
}
