// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for registry membership.

use crate::core::metrics;
use crate::core::protocol::{RelayFrame, departure_text};
use crate::core::state::{ClientConnection, ServerState};
use std::sync::Arc;
use tracing::{debug, info};

/// Keeps a connection registered for exactly as long as the guard lives.
///
/// Creating the guard registers the connection. Dropping it, on any exit path
/// of the session loop including a panic, removes the connection and announces
/// the departure to everyone still registered.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    conn: Arc<ClientConnection>,
}

impl ConnectionGuard {
    /// Registers `conn` and returns the guard that will deregister it.
    pub fn register(state: Arc<ServerState>, conn: Arc<ClientConnection>) -> Self {
        if state.registry.register(conn.clone()) {
            metrics::CONNECTED_CLIENTS.inc();
        } else {
            debug!("Connection {} was already registered.", conn.id);
        }
        Self { state, conn }
    }

    pub fn connection(&self) -> &Arc<ClientConnection> {
        &self.conn
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.state.registry.deregister(self.conn.id).is_none() {
            debug!(
                "Connection {} was not in the registry upon cleanup.",
                self.conn.addr
            );
            return;
        }
        metrics::CONNECTED_CLIENTS.dec();

        // The departing connection is already out of the registry, so a plain
        // broadcast reaches only the remaining peers.
        let marker = &self.state.config.relay.departure_marker;
        let announcement = departure_text(&self.conn.client_id, marker);
        let outcome = self
            .state
            .dispatcher
            .broadcast_all(RelayFrame::text(announcement));
        info!(
            "Client {} ({}) left; departure announced to {} peer(s).",
            self.conn.client_id, self.conn.addr, outcome.delivered
        );
    }
}
