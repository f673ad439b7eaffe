//! Peer identifiers.
//!
//! A [`PeerId`] is an opaque 32-byte identifier assigned by the overlay.
//! The router never interprets the bytes; it only compares them, hashes
//! them into its indexes, and carries them on the wire as the `from`
//! field of a message. Credential material and identity verification are
//! overlay concerns.

use std::fmt;

use rand::RngCore;

/// Length of a peer identifier in bytes.
pub const PEER_ID_LEN: usize = 32;

/// Opaque identifier for a node in the overlay.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId([u8; PEER_ID_LEN]);

impl PeerId {
    #[inline]
    pub fn from_bytes(bytes: [u8; PEER_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        let mut bytes = [0u8; PEER_ID_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; PEER_ID_LEN] {
        &self.0
    }

    /// Parse an identifier from its wire form. Anything but exactly 32
    /// bytes is rejected.
    pub fn from_wire(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; PEER_ID_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; PEER_ID_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix keeps log lines readable.
        write!(f, "PeerId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
