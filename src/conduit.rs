//! Per-peer frame transport.
//!
//! A [`Conduit`] owns the two tasks serving one peer: a writer draining
//! a bounded outbound queue to the stream, and a reader decoding inbound
//! frames into the router's event channel. The router only ever touches
//! the queue handle, so a slow or dead peer can never block the loop.

use prost::Message as _;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::floodsub::RouterEvent;
use crate::identity::PeerId;
use crate::wire::{self, Frame};

pub(crate) struct Conduit {
    peer: PeerId,
    generation: u64,
    outbound: mpsc::Sender<Frame>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl Conduit {
    /// Split `stream` and start the writer/reader pair.
    ///
    /// `generation` tags the close event this conduit will eventually
    /// emit, so the router can ignore stragglers from a replaced
    /// conduit.
    pub fn spawn<S>(
        peer: PeerId,
        generation: u64,
        stream: S,
        queue_capacity: usize,
        events: mpsc::Sender<RouterEvent>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut read_half, mut write_half) = tokio::io::split(stream);
        let (outbound, mut outbound_rx) = mpsc::channel::<Frame>(queue_capacity);

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(error) = wire::write_frame(&mut write_half, &frame).await {
                    debug!(peer = ?peer, %error, "peer stream write failed");
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            loop {
                match wire::read_frame_bytes(&mut read_half).await {
                    Ok(Some(bytes)) => match Frame::decode(bytes.as_slice()) {
                        Ok(frame) => {
                            if events
                                .send(RouterEvent::Frame { peer, frame })
                                .await
                                .is_err()
                            {
                                // Router gone; nothing left to notify.
                                return;
                            }
                        }
                        Err(error) => {
                            // A frame that does not decode is dropped;
                            // the connection itself stays up.
                            warn!(peer = ?peer, %error, "dropping undecodable frame");
                        }
                    },
                    Ok(None) => break,
                    Err(error) => {
                        debug!(peer = ?peer, %error, "peer stream read failed");
                        break;
                    }
                }
            }
            let _ = events
                .send(RouterEvent::ReadClosed { peer, generation })
                .await;
        });

        Self {
            peer,
            generation,
            outbound,
            writer,
            reader,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a frame for the peer. Never blocks: when the queue is full
    /// the frame is dropped, which flood semantics tolerate.
    pub fn enqueue(&self, frame: Frame) {
        match self.outbound.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!(peer = ?self.peer, "outbound queue full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!(peer = ?self.peer, "outbound queue closed, dropping frame");
            }
        }
    }

    /// Tear down both tasks. In-flight outgoing frames are discarded.
    pub fn close(&self) {
        self.writer.abort();
        self.reader.abort();
    }
}

impl Drop for Conduit {
    fn drop(&mut self) {
        self.close();
    }
}
