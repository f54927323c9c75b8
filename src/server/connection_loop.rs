// src/server/connection_loop.rs

//! Serves connections until a shutdown signal arrives, then winds everything down.

use super::context::ServerContext;
use super::routes::build_router;
use crate::core::state::ServerState;
use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// The main server loop: serves HTTP and WebSocket traffic and handles graceful shutdown.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let state = ctx.state.clone();
    let app = build_router(ctx.state.clone(), ctx.shutdown_tx.clone());
    let shutdown_tx = ctx.shutdown_tx.clone();
    let mut background_tasks = std::mem::take(&mut ctx.background_tasks);

    let shutdown_signal = async move {
        tokio::select! {
            biased;
            _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
            _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
            Some(res) = background_tasks.join_next() => match res {
                Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                Ok(Err(e)) => error!("CRITICAL: Background task failed: {}. Shutting down.", e),
                Err(e) => error!("CRITICAL: Background task panicked: {e:?}. Shutting down."),
            },
        }
        info!("Shutting down. Sending signal to all tasks.");
        if shutdown_tx.send(()).is_err() {
            warn!("No session or task was listening for the shutdown signal.");
        }
        background_tasks
    };

    let (tasks_tx, tasks_rx) = tokio::sync::oneshot::channel();
    axum::serve(
        ctx.listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let tasks = shutdown_signal.await;
        let _ = tasks_tx.send(tasks);
    })
    .await
    .context("HTTP server failed")?;
    wait_for_sessions(&state).await;

    if let Ok(tasks) = tasks_rx.await {
        drain_background_tasks(tasks).await;
    }
    drop(ctx.shutdown_tx);
    info!("Server shutdown complete.");
    Ok(())
}

/// Upgraded sessions are detached from the HTTP server, so they are awaited
/// separately: each one saw the shutdown signal and is flushing its writer.
async fn wait_for_sessions(state: &ServerState) {
    let grace = Duration::from_millis(state.config.writer_shutdown_timeout_ms);
    let deadline = Instant::now() + grace;
    while !state.registry.is_empty() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    match state.registry.len() {
        0 => info!("All client connections closed."),
        n => warn!("{} client connection(s) still open after {:?}.", n, grace),
    }
}

async fn drain_background_tasks(mut tasks: JoinSet<Result<()>>) {
    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
        tasks.shutdown().await;
    };
}
