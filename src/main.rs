//! Peg Drop Server
//!
//! Serves provably-fair peg-drop rounds over WebSocket.

use std::sync::Arc;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use peg_drop::{RoundServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let default_level = if cfg!(feature = "debug-tracing") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = ServerConfig::from_env().context("failed to load configuration")?;

    info!("Peg Drop Server v{}", VERSION);
    info!(
        "Rows: default {}, max {}; max connections {}",
        config.rounds.default_rows, config.rounds.max_rows, config.max_connections
    );

    let server = Arc::new(RoundServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            signal_server.shutdown();
        }
    });

    server.run().await.context("server failed")?;

    info!("Server stopped");
    Ok(())
}
