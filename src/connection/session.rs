// src/connection/session.rs

//! Defines the state associated with a single relay session.

use crate::core::identity::ClientId;
use crate::core::state::ConnectionId;
use tracing::{debug, warn};

/// The phases of a session, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Handshaking,
    Registered,
    Relaying,
    Closing,
    Deregistered,
}

impl SessionPhase {
    fn next(self) -> Option<SessionPhase> {
        match self {
            SessionPhase::Handshaking => Some(SessionPhase::Registered),
            SessionPhase::Registered => Some(SessionPhase::Relaying),
            SessionPhase::Relaying => Some(SessionPhase::Closing),
            SessionPhase::Closing => Some(SessionPhase::Deregistered),
            SessionPhase::Deregistered => None,
        }
    }
}

/// Holds the state specific to a single session.
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    pub client_id: ClientId,
    phase: SessionPhase,
    /// Messages read from this peer and handed to the dispatcher.
    pub messages_relayed: u64,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId, client_id: ClientId) -> Self {
        Self {
            connection_id,
            client_id,
            phase: SessionPhase::Handshaking,
            messages_relayed: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Moves to `to`, which must be the phase directly after the current one.
    /// Out-of-order transitions are logged and ignored.
    pub fn advance(&mut self, to: SessionPhase) {
        if self.phase.next() != Some(to) {
            warn!(
                "Session {}: ignoring invalid transition {:?} -> {:?}",
                self.connection_id, self.phase, to
            );
            return;
        }
        debug!(
            "Session {}: {:?} -> {:?}",
            self.connection_id, self.phase, to
        );
        self.phase = to;
    }
}
