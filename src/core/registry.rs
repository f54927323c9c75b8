// src/core/registry.rs

//! The connection registry: the authoritative set of live connections.
//!
//! Entries are keyed by `ConnectionId`, never by `ClientId`, since two
//! connections may derive the same identifier. All access goes through the
//! methods below; the underlying map is never exposed.

use crate::core::state::{ClientConnection, ConnectionId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::debug;

/// A concurrency-safe set of live connections.
///
/// The registry holds shared handles only. It never closes a connection; that
/// is the job of the session loop that registered it.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<ClientConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a connection to the live set.
    ///
    /// Returns `false` if a connection with the same key was already present,
    /// in which case the existing entry is kept.
    pub fn register(&self, conn: Arc<ClientConnection>) -> bool {
        let id = conn.id;
        let inserted = match self.connections.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(conn);
                true
            }
        };
        debug!(
            "Registry: register connection {} (inserted={}, live={}).",
            id,
            inserted,
            self.connections.len()
        );
        inserted
    }

    /// Removes a connection from the live set. Idempotent.
    pub fn deregister(&self, id: ConnectionId) -> Option<Arc<ClientConnection>> {
        let removed = self.connections.remove(&id).map(|(_, conn)| conn);
        debug!(
            "Registry: deregister connection {} (present={}, live={}).",
            id,
            removed.is_some(),
            self.connections.len()
        );
        removed
    }

    /// Visits every registered connection.
    ///
    /// Iteration holds a read lock on one shard at a time, so concurrent
    /// register/deregister calls are never lost or torn. The visitor must not
    /// call back into `register` or `deregister`.
    pub fn for_each(&self, mut visit: impl FnMut(&Arc<ClientConnection>)) {
        for entry in self.connections.iter() {
            visit(entry.value());
        }
    }

    /// Returns a point-in-time copy of the live set.
    pub fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    /// Returns the first registered connection whose identifier equals `client_id`.
    ///
    /// When several connections share the identifier, whichever the scan meets
    /// first is returned.
    pub fn find_by_identifier(&self, client_id: &str) -> Option<Arc<ClientConnection>> {
        self.connections
            .iter()
            .find(|e| e.value().client_id == client_id)
            .map(|e| e.value().clone())
    }

    pub fn get(&self, id: ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.get(&id).map(|e| e.value().clone())
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
