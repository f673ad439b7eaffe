//! # Spate - Flood Publish/Subscribe for Peer-to-Peer Overlays
//!
//! Spate routes topic-addressed messages across a peer-to-peer overlay
//! by flooding: every newly-seen message is forwarded to every connected
//! peer that has declared interest in one of its topics. Delivery is
//! best-effort and unordered across origins; duplicates are suppressed
//! by message identity.
//!
//! ## Architecture
//!
//! The router uses the **actor pattern**: a cheap-to-clone [`FloodSub`]
//! handle submits commands over an async channel to a private actor that
//! owns all mutable state and processes events sequentially. Around the
//! loop run one reader and one writer task per peer and a bounded pool
//! of validator tasks; parallelism exists only at the I/O and validator
//! boundaries.
//!
//! The overlay itself — dialing, transport security, stream
//! negotiation — is not this crate's business. The router consumes the
//! [`Overlay`] capability: a local peer identity plus a stream of
//! peer-joined/peer-left events, each join carrying one bidirectional
//! protocol stream. [`MemOverlay`] implements it in-process for tests
//! and local wiring.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `floodsub` | Router actor, public handle, subscription and peer indexes |
//! | `conduit` | Per-peer writer/reader task pair over one stream |
//! | `validate` | Capped concurrent execution of delivery validators |
//! | `seen` | Time-windowed duplicate suppression |
//! | `wire` | Protobuf frame schema and length-delimited stream I/O |
//! | `overlay` | Network capability trait and in-memory implementation |
//! | `identity` | Opaque 32-byte peer identifiers |
//!
//! ## Quick Start
//!
//! ```ignore
//! let net_a = MemOverlay::new();
//! let net_b = MemOverlay::new();
//! let a = FloodSub::spawn(&net_a, FloodSubConfig::default());
//! let b = FloodSub::spawn(&net_b, FloodSubConfig::default());
//!
//! let mut sub = b.subscribe("updates").await?;
//! net_a.connect(&net_b).await?;
//! tokio::time::sleep(Duration::from_millis(50)).await; // announce exchange
//!
//! a.publish("updates", b"hello world".to_vec()).await?;
//! let msg = sub.next().await?;
//! assert_eq!(msg.data, b"hello world");
//! ```

mod conduit;
mod floodsub;
mod identity;
mod overlay;
mod seen;
mod validate;
mod wire;

pub use floodsub::{
    FloodSub, FloodSubConfig, Message, MessageRejection, SubscribeOpts, Subscription,
    DEFAULT_DELIVERY_QUEUE_CAPACITY, DEFAULT_PEER_QUEUE_CAPACITY, DEFAULT_SEEN_CAPACITY,
    DEFAULT_SEEN_TTL, DEFAULT_VALIDATOR_CONCURRENCY, DEFAULT_VALIDATOR_TIMEOUT, MAX_PUBLISH_SIZE,
    PROTOCOL_ID,
};
pub use identity::{PeerId, PEER_ID_LEN};
pub use overlay::{MemOverlay, Overlay, OverlayEvent};
pub use validate::ValidatorFn;
