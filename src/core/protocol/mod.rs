// src/core/protocol/mod.rs

//! Message types carried by the relay and the announcement texts it emits.

pub mod frame;
pub use frame::{FrameKind, RelayFrame, departure_text, welcome_text};
