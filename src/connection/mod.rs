// src/connection/mod.rs

//! Manages the lifecycle of a single WebSocket peer: registration, the welcome
//! message, the relay loop, and deregistration with its departure announcement.

// Declare the private sub-modules of the `connection` module.
mod guard;
mod handler;
mod session;
mod writer;

// Publicly re-export the primary types from the sub-modules.
pub use guard::ConnectionGuard;
pub use handler::{CloseReason, ConnectionHandler, is_normal_disconnect, serve};
pub use session::{SessionPhase, SessionState};
