// src/core/identity.rs

//! Derives the opaque client identifier announced to every peer.
//!
//! The identifier is the lowercase hex SHA-1 digest of the connection's remote
//! address string. Two connections sharing an address (e.g. behind NAT with a
//! reused port) share an identifier; this is accepted, the value is a label and
//! not an authenticated identity.

use sha1::{Digest, Sha1};
use std::fmt;

/// Length of a client identifier in hex characters.
pub const CLIENT_ID_LEN: usize = 40;

/// A fixed-length hexadecimal client identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Derives the identifier for a remote-address string. Pure and deterministic.
    pub fn derive(remote_addr: &str) -> Self {
        let digest = Sha1::digest(remote_addr.as_bytes());
        ClientId(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ClientId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ClientId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
