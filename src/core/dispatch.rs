// src/core/dispatch.rs

//! The dispatch engine: unicast and broadcast sends against the registry.
//!
//! Every send is an enqueue onto the target's bounded outbound queue, so a
//! slow peer never holds up delivery to the others. A failed enqueue affects
//! only that target; it is logged, counted, and otherwise ignored.

use crate::core::RelayError;
use crate::core::metrics;
use crate::core::protocol::RelayFrame;
use crate::core::registry::ConnectionRegistry;
use crate::core::state::{ClientConnection, ConnectionId};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a single dispatch call achieved. Callers on the relay path ignore it;
/// it exists for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Targets whose queue accepted the frame.
    pub delivered: usize,
    /// Targets whose queue was full or closed.
    pub failed: usize,
}

impl DispatchOutcome {
    fn record(&mut self, result: Result<(), RelayError>, target: &ClientConnection) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(e) => {
                self.failed += 1;
                log_send_failure(target, &e);
            }
        }
    }
}

/// Sends frames to registered connections.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Sends `frame` to the connection whose identifier is `client_id`.
    /// A miss is a silent no-op.
    pub fn unicast(&self, client_id: &str, frame: RelayFrame) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        match self.registry.find_by_identifier(client_id) {
            Some(target) => {
                let result = target.send(frame);
                outcome.record(result, &target);
                debug!(
                    "Unicast to {} (connection {}): delivered={}",
                    client_id, target.id, outcome.delivered
                );
            }
            None => {
                debug!("Unicast target {} is not connected; dropping.", client_id);
            }
        }
        outcome
    }

    /// Sends `frame`, with its kind preserved, to every registered connection
    /// except `sender`.
    pub fn broadcast_except(&self, sender: ConnectionId, frame: RelayFrame) -> DispatchOutcome {
        let outcome = self.fan_out(Some(sender), &frame);
        debug!(
            "Relayed {} frame ({} bytes) from connection {}: delivered={}, failed={}",
            frame.kind().as_str(),
            frame.len(),
            sender,
            outcome.delivered,
            outcome.failed
        );
        outcome
    }

    /// Sends `frame` to every registered connection.
    pub fn broadcast_all(&self, frame: RelayFrame) -> DispatchOutcome {
        let outcome = self.fan_out(None, &frame);
        debug!(
            "Broadcast {} frame ({} bytes): delivered={}, failed={}",
            frame.kind().as_str(),
            frame.len(),
            outcome.delivered,
            outcome.failed
        );
        outcome
    }

    fn fan_out(&self, exclude: Option<ConnectionId>, frame: &RelayFrame) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        self.registry.for_each(|target| {
            if Some(target.id) == exclude {
                return;
            }
            let result = target.send(frame.clone());
            outcome.record(result, target);
        });
        outcome
    }
}

fn log_send_failure(target: &ClientConnection, e: &RelayError) {
    match e {
        RelayError::QueueFull(_) => {
            metrics::DISPATCH_FAILURES_TOTAL
                .with_label_values(&["queue_full"])
                .inc();
            warn!(
                "Dropping message for {} ({}): outbound queue is full.",
                target.addr, target.client_id
            );
        }
        RelayError::ConnectionClosed(_) => {
            metrics::DISPATCH_FAILURES_TOTAL
                .with_label_values(&["closed"])
                .inc();
            debug!(
                "Dropping message for {} ({}): connection already closed.",
                target.addr, target.client_id
            );
        }
        other => {
            metrics::DISPATCH_FAILURES_TOTAL
                .with_label_values(&["other"])
                .inc();
            warn!("Failed to enqueue message for {}: {}", target.addr, other);
        }
    }
}
