// src/server/initialization.rs

//! Handles server initialization: shared state and the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
///
/// Failing to bind the configured endpoint is the one error that stops the
/// process.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let local_addr = listener.local_addr()?;
    info!("wsrelay listening on http://{}", local_addr);
    info!("WebSocket endpoint: ws://{}{}", local_addr, config.relay.ws_path);

    let state = ServerState::new(config);

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!("Starting wsrelay v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Limits: max_clients={}, outbound_queue_capacity={}",
        config.max_clients, config.outbound_queue_capacity
    );
    if config.triggers.enabled {
        info!("Trigger routes enabled: /send-one, /send-many");
    } else {
        info!("Trigger routes are disabled in the configuration.");
    }
}
