//! shelf-bm - Book Metadata microservice
//!
//! **Module Identity:**
//! - Name: shelf-bm (Book Metadata)
//! - Port: 3001 (default)
//!
//! Relays ISBN lookups to a web-search-enabled language model, gates the
//! reply on an exact identifier match, and attaches a verified cover image.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shelf_bm::config::{CliOverrides, ServiceConfig, TomlConfig};
use shelf_bm::{build_router, AppState};
use shelf_common::config::load_toml_config;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for shelf-bm
#[derive(Parser, Debug)]
#[command(name = "shelf-bm")]
#[command(about = "Book Metadata microservice for SHELF")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SHELF_BM_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "SHELF_BM_HOST")]
    host: Option<String>,

    /// TOML bootstrap config file
    #[arg(short, long, env = "SHELF_BM_CONFIG")]
    config: Option<PathBuf>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Model used for metadata lookups
    #[arg(long, env = "SHELF_BM_MODEL")]
    model: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            openai_api_key: self.openai_api_key.clone(),
            openai_model: self.model.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Bootstrap file first: it may carry the log level
    let loaded = load_toml_config::<TomlConfig>(args.config.as_deref(), "shelf-bm")
        .context("Failed to load configuration file")?;
    let config = ServiceConfig::resolve(args.overrides(), loaded.config)
        .context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting SHELF Book Metadata (shelf-bm) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &loaded.source {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }
    info!(model = %config.provider.model, "Metadata provider configured");

    let http_client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState::from_config(&config, http_client);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
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
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
