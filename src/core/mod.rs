// src/core/mod.rs

//! The central module containing the relay's core logic and data structures.

pub mod dispatch;
pub mod errors;
pub mod identity;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod state;

pub use dispatch::{DispatchOutcome, Dispatcher};
pub use errors::RelayError;
pub use identity::ClientId;
pub use protocol::RelayFrame;
pub use registry::ConnectionRegistry;
