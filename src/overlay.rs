//! The overlay network capability consumed by the router.
//!
//! The router does not dial, secure, or multiplex connections; it is
//! handed one bidirectional protocol stream per connected peer and a
//! notification when a peer goes away. [`Overlay`] is that seam:
//! protocol code depends on the trait, transport code implements it.
//!
//! [`MemOverlay`] is the in-process implementation over duplex pipes,
//! used by the test suites and suitable for wiring several routers
//! together inside one process.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::sync::mpsc;

use crate::identity::PeerId;

/// Capacity of the connectivity event channel handed to the router.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// In-memory buffer of each direction of a [`MemOverlay`] stream.
const STREAM_BUFFER: usize = 256 * 1024;

/// Connectivity events delivered to the router.
pub enum OverlayEvent<S> {
    /// A peer connected; `stream` is the already-negotiated protocol
    /// stream for it (one bidirectional stream per peer).
    PeerJoined { peer: PeerId, stream: S },
    /// A peer disconnected. Stream teardown without this event is also
    /// detected by the router through reader EOF.
    PeerLeft { peer: PeerId },
}

/// A peer-to-peer overlay as the router sees it.
pub trait Overlay {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// This node's identity in the overlay.
    fn local_peer(&self) -> PeerId;

    /// Register the handler for `protocol` and take the connectivity
    /// event stream.
    ///
    /// # Panics
    /// May only be called once per overlay instance.
    fn attach(&self, protocol: &str) -> mpsc::Receiver<OverlayEvent<Self::Stream>>;
}

/// In-memory overlay over duplex pipes.
pub struct MemOverlay {
    peer: PeerId,
    events_tx: mpsc::Sender<OverlayEvent<DuplexStream>>,
    events_rx: Mutex<Option<mpsc::Receiver<OverlayEvent<DuplexStream>>>>,
}

impl MemOverlay {
    pub fn new() -> Self {
        Self::with_peer(PeerId::random())
    }

    pub fn with_peer(peer: PeerId) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            peer,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Connect two overlays with a fresh duplex stream pair, notifying
    /// both routers. Connecting the same pair again replaces the
    /// previous streams.
    pub async fn connect(&self, other: &MemOverlay) -> Result<()> {
        let (here, there) = tokio::io::duplex(STREAM_BUFFER);
        self.events_tx
            .send(OverlayEvent::PeerJoined {
                peer: other.peer,
                stream: here,
            })
            .await
            .map_err(|_| anyhow!("overlay {:?} is detached", self.peer))?;
        other
            .events_tx
            .send(OverlayEvent::PeerJoined {
                peer: self.peer,
                stream: there,
            })
            .await
            .map_err(|_| anyhow!("overlay {:?} is detached", other.peer))?;
        Ok(())
    }

    /// Sever the connection between two overlays, notifying both
    /// routers.
    pub async fn disconnect(&self, other: &MemOverlay) -> Result<()> {
        self.events_tx
            .send(OverlayEvent::PeerLeft { peer: other.peer })
            .await
            .map_err(|_| anyhow!("overlay {:?} is detached", self.peer))?;
        other
            .events_tx
            .send(OverlayEvent::PeerLeft { peer: self.peer })
            .await
            .map_err(|_| anyhow!("overlay {:?} is detached", other.peer))?;
        Ok(())
    }
}

impl Default for MemOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlay for MemOverlay {
    type Stream = DuplexStream;

    fn local_peer(&self) -> PeerId {
        self.peer
    }

    fn attach(&self, _protocol: &str) -> mpsc::Receiver<OverlayEvent<DuplexStream>> {
        self.events_rx
            .lock()
            .expect("overlay mutex poisoned")
            .take()
            .expect("attach may only be called once per overlay")
    }
}
