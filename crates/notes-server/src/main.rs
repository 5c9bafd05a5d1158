//! # Secure Notes Server
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration from `NOTES_*` environment variables
//! 3. Validate it and build the token and content codecs; any error aborts
//! 4. Serve HTTP until Ctrl+C, then drain in-flight requests

use anyhow::{Context, Result};
use notes_api::{NotesServer, ServiceConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    let config = ServiceConfig::from_env().context("failed to load configuration")?;
    info!(addr = %config.http_addr(), "Starting notes server");

    let server = match NotesServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return Err(e).context("invalid configuration");
        }
    };

    server.serve(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
