// src/core/errors.rs

//! Defines the primary error type for the relay.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all failures the relay core can report.
/// None of these are fatal to the process; callers log them and move on.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The target's outbound queue has no free slot.
    #[error("Outbound queue full for connection {0}")]
    QueueFull(u64),

    /// The target's writer task has already finished.
    #[error("Connection {0} is closed")]
    ConnectionClosed(u64),

    #[error("Too many clients: limit of {0} reached")]
    CapacityExhausted(usize),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for RelayError {
    fn clone(&self) -> Self {
        match self {
            RelayError::Io(e) => RelayError::Io(Arc::clone(e)),
            RelayError::Transport(s) => RelayError::Transport(s.clone()),
            RelayError::QueueFull(id) => RelayError::QueueFull(*id),
            RelayError::ConnectionClosed(id) => RelayError::ConnectionClosed(*id),
            RelayError::CapacityExhausted(n) => RelayError::CapacityExhausted(*n),
            RelayError::Internal(s) => RelayError::Internal(s.clone()),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(Arc::new(e))
    }
}

impl From<axum::Error> for RelayError {
    fn from(e: axum::Error) -> Self {
        RelayError::Transport(e.to_string())
    }
}
