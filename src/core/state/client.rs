// src/core/state/client.rs

//! Contains state definitions related to client connections.

use crate::core::RelayError;
use crate::core::identity::ClientId;
use crate::core::protocol::RelayFrame;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Process-unique key of a live connection. Assigned once per accepted upgrade
/// and never reused while the process runs.
pub type ConnectionId = u64;

/// The record of one live connection, shared between its session loop, the
/// registry, and any dispatch in flight.
///
/// It holds only the sending half of the connection's outbound queue. The
/// transport itself is owned by the writer task of the session that created it,
/// so nothing reachable from the registry can close the connection.
#[derive(Debug)]
pub struct ClientConnection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    /// Derived once from `addr` when the record is created.
    pub client_id: ClientId,
    pub created: Instant,
    outbound: mpsc::Sender<RelayFrame>,
}

impl ClientConnection {
    pub fn new(id: ConnectionId, addr: SocketAddr, outbound: mpsc::Sender<RelayFrame>) -> Self {
        Self {
            id,
            addr,
            client_id: ClientId::derive(&addr.to_string()),
            created: Instant::now(),
            outbound,
        }
    }

    /// Enqueues a frame for this connection's writer without waiting.
    pub fn send(&self, frame: RelayFrame) -> Result<(), RelayError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::QueueFull(self.id),
            TrySendError::Closed(_) => RelayError::ConnectionClosed(self.id),
        })
    }

    /// True once the writer task has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}
