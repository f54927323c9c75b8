// src/core/protocol/frame.rs

//! Defines `RelayFrame`, the kind-preserving payload moved through the dispatch engine.

use crate::core::identity::ClientId;
use axum::extract::ws::{Message, Utf8Bytes};
use bytes::Bytes;

/// Prefix of both the welcome and the departure announcements.
pub const CLIENT_ID_PREFIX: &str = "clientID:";
/// Separator between the identifier and the departure marker.
pub const DEPARTURE_SEPARATOR: &str = "==>";

/// The kind tag of a relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Text => "text",
            FrameKind::Binary => "binary",
        }
    }
}

/// An opaque data payload together with its kind.
///
/// Both variants are reference counted, so cloning a frame for every recipient
/// of a fan-out does not copy the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    Text(Utf8Bytes),
    Binary(Bytes),
}

impl RelayFrame {
    pub fn text(s: impl Into<String>) -> Self {
        RelayFrame::Text(Utf8Bytes::from(s.into()))
    }

    pub fn binary(b: impl Into<Bytes>) -> Self {
        RelayFrame::Binary(b.into())
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            RelayFrame::Text(_) => FrameKind::Text,
            RelayFrame::Binary(_) => FrameKind::Binary,
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            RelayFrame::Text(t) => t.as_str().len(),
            RelayFrame::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the text payload, or `None` for binary frames.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RelayFrame::Text(t) => Some(t.as_str()),
            RelayFrame::Binary(_) => None,
        }
    }

    /// Extracts a relayable frame from a transport message.
    /// Control messages (ping, pong, close) yield `None`.
    pub fn from_message(msg: Message) -> Option<Self> {
        match msg {
            Message::Text(t) => Some(RelayFrame::Text(t)),
            Message::Binary(b) => Some(RelayFrame::Binary(b)),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
        }
    }
}

impl From<RelayFrame> for Message {
    fn from(frame: RelayFrame) -> Self {
        match frame {
            RelayFrame::Text(t) => Message::Text(t),
            RelayFrame::Binary(b) => Message::Binary(b),
        }
    }
}

/// `clientID:<id>`, sent to a peer right after it connects.
pub fn welcome_text(client_id: &ClientId) -> String {
    format!("{CLIENT_ID_PREFIX}{client_id}")
}

/// `clientID:<id>==><marker>`, broadcast when a peer leaves.
pub fn departure_text(client_id: &ClientId, marker: &str) -> String {
    format!("{CLIENT_ID_PREFIX}{client_id}{DEPARTURE_SEPARATOR}{marker}")
}
