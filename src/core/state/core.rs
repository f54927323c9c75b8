// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::ConnectionId;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::dispatch::Dispatcher;
use crate::core::registry::ConnectionRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tracing::info;

/// The central struct holding all shared, server-wide state.
/// It is wrapped in an `Arc` and handed to every session loop and trigger handler.
/// The registry is the only mutable shared structure; everything else is
/// either immutable after startup or atomic.
#[derive(Debug)]
pub struct ServerState {
    /// The server's configuration, fixed for the lifetime of the process.
    pub config: Config,
    /// The authoritative set of live connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Unicast and broadcast sends against `registry`.
    pub dispatcher: Dispatcher,
    /// Admission control: one permit per live session, `max_clients` in total.
    pub connection_permits: Arc<Semaphore>,
    /// Holds all server-wide statistics.
    pub stats: StatsState,
    next_connection_id: AtomicU64,
}

impl ServerState {
    /// Builds the shared state from a validated configuration.
    pub fn new(config: Config) -> Arc<Self> {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());
        let connection_permits = Arc::new(Semaphore::new(config.max_clients));
        info!(
            "Server state initialized (max_clients={}, outbound_queue_capacity={}).",
            config.max_clients, config.outbound_queue_capacity
        );
        Arc::new(Self {
            config,
            registry,
            dispatcher,
            connection_permits,
            stats: StatsState::new(),
            next_connection_id: AtomicU64::new(0),
        })
    }

    /// Allocates the key for a newly accepted connection.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}
