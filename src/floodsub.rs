//! Flood-based publish/subscribe router.
//!
//! Every node forwards each newly-seen message to every connected peer
//! that has declared interest in one of the message's topics. Delivery
//! is best-effort and unordered across origins; duplicates are
//! suppressed by message identity `(from, seqno)`.
//!
//! ## Architecture
//!
//! The module follows the handle/actor split used throughout this
//! codebase: [`FloodSub`] is a cheap-to-clone handle that submits
//! commands over a channel, and `FloodSubActor` owns every mutable
//! index and processes events sequentially in a single task. Around the
//! loop run one reader and one writer task per peer (see
//! [`crate::conduit`]) and up to `validator_concurrency` validator
//! tasks (see [`crate::validate`]); nothing else touches router state.
//!
//! ## Event flow
//!
//! | Source | Events |
//! |--------|--------|
//! | Host API | subscribe, cancel, publish, topic/peer queries, shutdown |
//! | Overlay | peer joined (with its protocol stream), peer left |
//! | Conduits | inbound frame, stream closed |
//! | Validator pool | per-message verdicts |
//!
//! Handlers never block: peer sends drop on full queues, and validator
//! dispatch is fire-and-forget with the verdict arriving as an event.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{anyhow, Result};
use rand::Rng;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::conduit::Conduit;
use crate::identity::PeerId;
use crate::overlay::{Overlay, OverlayEvent};
use crate::seen::{MessageKey, SeenCache};
use crate::validate::{ValidatorFn, ValidatorPool};
use crate::wire::Frame;

/// Protocol identifier spoken on every conduit stream.
pub const PROTOCOL_ID: &str = "/floodsub/1.0.0";

/// Process-wide cap on concurrently running validators.
pub const DEFAULT_VALIDATOR_CONCURRENCY: usize = 10;

/// Deadline for a single validator invocation.
pub const DEFAULT_VALIDATOR_TIMEOUT: Duration = Duration::from_millis(150);

/// Retention window for message identities in the seen cache.
pub const DEFAULT_SEEN_TTL: Duration = Duration::from_secs(120);

/// Hard cap on seen-cache entries.
/// Not part of the protocol; bounds memory under sustained flood.
pub const DEFAULT_SEEN_CAPACITY: usize = 32_768;

/// Capacity of each peer's outbound frame queue.
pub const DEFAULT_PEER_QUEUE_CAPACITY: usize = 32;

/// Capacity of each subscription's delivery queue.
pub const DEFAULT_DELIVERY_QUEUE_CAPACITY: usize = 32;

/// Maximum published payload size (64 KiB).
pub const MAX_PUBLISH_SIZE: usize = 64 * 1024;

const COMMAND_QUEUE_CAPACITY: usize = 256;
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Router tunables.
#[derive(Clone, Debug)]
pub struct FloodSubConfig {
    /// Cap on concurrently running validator invocations.
    pub validator_concurrency: usize,
    /// Default per-validator deadline; overridable per subscription.
    pub validator_timeout: Duration,
    /// Retention window for message identities.
    pub seen_ttl: Duration,
    /// Hard cap on seen-cache entries.
    pub seen_capacity: usize,
    /// Outbound frame queue capacity per peer.
    pub peer_queue_capacity: usize,
    /// Delivery queue capacity per subscription.
    pub delivery_queue_capacity: usize,
}

impl Default for FloodSubConfig {
    fn default() -> Self {
        Self {
            validator_concurrency: DEFAULT_VALIDATOR_CONCURRENCY,
            validator_timeout: DEFAULT_VALIDATOR_TIMEOUT,
            seen_ttl: DEFAULT_SEEN_TTL,
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            peer_queue_capacity: DEFAULT_PEER_QUEUE_CAPACITY,
            delivery_queue_capacity: DEFAULT_DELIVERY_QUEUE_CAPACITY,
        }
    }
}

/// A routed message as seen by subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Origin node.
    pub from: PeerId,
    /// Origin-unique sequence bytes; `(from, seqno)` is the identity.
    pub seqno: Vec<u8>,
    /// Application payload.
    pub data: Vec<u8>,
    /// Topics this message was published to. Never empty.
    pub topics: Vec<String>,
}

impl Message {
    pub(crate) fn key(&self) -> MessageKey {
        MessageKey {
            from: self.from,
            seqno: self.seqno.clone(),
        }
    }
}

/// Argument rejections surfaced from `subscribe` and `publish`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageRejection {
    /// Topic names must be non-empty.
    EmptyTopic,
    /// Payload exceeds [`MAX_PUBLISH_SIZE`].
    MessageTooLarge,
}

impl std::fmt::Display for MessageRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTopic => write!(f, "topic name cannot be empty"),
            Self::MessageTooLarge => write!(f, "message size exceeds maximum allowed"),
        }
    }
}

impl std::error::Error for MessageRejection {}

/// Options for [`FloodSub::subscribe_with`].
#[derive(Default)]
pub struct SubscribeOpts {
    validator: Option<ValidatorFn>,
    validator_timeout: Option<Duration>,
}

impl SubscribeOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a validator predicate gating delivery on this
    /// subscription. The message is accepted only if every validator on
    /// the topic resolves `true` within its deadline.
    pub fn validator<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        self.validator = Some(std::sync::Arc::new(move |msg| Box::pin(f(msg))));
        self
    }

    /// Override the validator deadline for this subscription.
    pub fn validator_timeout(mut self, timeout: Duration) -> Self {
        self.validator_timeout = Some(timeout);
        self
    }
}

// ============================================================================
// Commands sent from handle to actor
// ============================================================================

enum Command {
    Subscribe {
        topic: String,
        opts: SubscribeOpts,
        reply: oneshot::Sender<Result<(u64, mpsc::Receiver<Message>)>>,
    },
    Cancel {
        topic: String,
        id: u64,
    },
    Publish {
        topic: String,
        data: Vec<u8>,
        reply: oneshot::Sender<Result<()>>,
    },
    GetTopics {
        reply: oneshot::Sender<Vec<String>>,
    },
    ListPeers {
        topic: String,
        reply: oneshot::Sender<Vec<PeerId>>,
    },
    Shutdown,
}

/// Events produced by conduits and the validator pool, consumed by the
/// router loop.
pub(crate) enum RouterEvent {
    Frame {
        peer: PeerId,
        frame: Frame,
    },
    ReadClosed {
        peer: PeerId,
        generation: u64,
    },
    Validated {
        source: Option<PeerId>,
        message: Message,
        accepted: bool,
    },
}

// ============================================================================
// Subscription handle
// ============================================================================

/// A live subscription to one topic.
///
/// Messages accepted for the topic arrive on an internal bounded queue;
/// consume them with [`next`](Self::next). Dropping the handle cancels
/// the subscription.
pub struct Subscription {
    topic: String,
    id: u64,
    queue: mpsc::Receiver<Message>,
    commands: mpsc::Sender<Command>,
    cancelled: bool,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next accepted message.
    ///
    /// Returns an error once the subscription has been cancelled or the
    /// router shut down and the queue drained. Apply
    /// `tokio::time::timeout` for a deadline.
    pub async fn next(&mut self) -> Result<Message> {
        self.queue
            .recv()
            .await
            .ok_or_else(|| anyhow!("subscription to {:?} ended", self.topic))
    }

    /// Cancel the subscription. Idempotent. The delivery queue closes
    /// immediately; the routing tables reconcile on the router's next
    /// turn.
    pub async fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.queue.close();
        let _ = self
            .commands
            .send(Command::Cancel {
                topic: self.topic.clone(),
                id: self.id,
            })
            .await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.cancelled {
            let _ = self.commands.try_send(Command::Cancel {
                topic: self.topic.clone(),
                id: self.id,
            });
        }
    }
}

// ============================================================================
// FloodSub handle (public API - cheap to clone)
// ============================================================================

/// Handle to a running flood router.
#[derive(Clone)]
pub struct FloodSub {
    commands: mpsc::Sender<Command>,
}

impl FloodSub {
    /// Attach to `overlay` and start the router loop.
    pub fn spawn<O: Overlay>(overlay: &O, config: FloodSubConfig) -> Self {
        let local_peer = overlay.local_peer();
        let network = overlay.attach(PROTOCOL_ID);
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        let actor = FloodSubActor::new(local_peer, config, event_tx);
        tokio::spawn(actor.run(command_rx, network, event_rx));

        Self { commands }
    }

    /// Subscribe to `topic` with default options.
    pub async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        self.subscribe_with(topic, SubscribeOpts::new()).await
    }

    /// Subscribe to `topic`, optionally attaching a validator.
    pub async fn subscribe_with(&self, topic: &str, opts: SubscribeOpts) -> Result<Subscription> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Subscribe {
                topic: topic.to_string(),
                opts,
                reply: tx,
            })
            .await
            .map_err(|_| anyhow!("floodsub router closed"))?;
        let (id, queue) = rx.await.map_err(|_| anyhow!("floodsub router closed"))??;
        Ok(Subscription {
            topic: topic.to_string(),
            id,
            queue,
            commands: self.commands.clone(),
            cancelled: false,
        })
    }

    /// Publish `data` to `topic`.
    ///
    /// Local subscribers existing at publish time receive the message
    /// through the same validation path as remote traffic; interested
    /// peers receive it on their conduits.
    pub async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Publish {
                topic: topic.to_string(),
                data,
                reply: tx,
            })
            .await
            .map_err(|_| anyhow!("floodsub router closed"))?;
        rx.await.map_err(|_| anyhow!("floodsub router closed"))?
    }

    /// Topics with at least one live local subscription.
    pub async fn topics(&self) -> Vec<String> {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::GetTopics { reply: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Connected peers that declared `topic`; the empty string lists
    /// every connected peer regardless of topic.
    pub async fn peers(&self, topic: &str) -> Vec<PeerId> {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::ListPeers {
                topic: topic.to_string(),
                reply: tx,
            })
            .await
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Stop the router: every conduit is torn down and every
    /// subscription queue closes. Subsequent API calls fail.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

// ============================================================================
// Local subscriber index
// ============================================================================

struct LocalSub {
    id: u64,
    queue: mpsc::Sender<Message>,
    validator: Option<ValidatorFn>,
    validator_timeout: Duration,
}

/// Topic name → live local subscriptions.
#[derive(Default)]
struct TopicTable {
    topics: HashMap<String, Vec<LocalSub>>,
}

impl TopicTable {
    /// Returns true when `sub` is the first subscription for the topic,
    /// which obliges the router to announce the join on the wire.
    fn add(&mut self, topic: &str, sub: LocalSub) -> bool {
        let bucket = self.topics.entry(topic.to_string()).or_default();
        bucket.push(sub);
        bucket.len() == 1
    }

    /// Returns true when the last subscription for the topic went away,
    /// which obliges the router to announce the leave.
    fn remove(&mut self, topic: &str, id: u64) -> bool {
        let Some(bucket) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|sub| sub.id != id);
        if bucket.len() == before {
            return false;
        }
        if bucket.is_empty() {
            self.topics.remove(topic);
            true
        } else {
            false
        }
    }

    fn subscribers(&self, topic: &str) -> &[LocalSub] {
        self.topics.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    fn topics(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    fn clear(&mut self) {
        self.topics.clear();
    }
}

// ============================================================================
// Connected peer index
// ============================================================================

struct PeerState {
    topics: HashSet<String>,
    conduit: Conduit,
}

/// Connected peers and their declared topic interests.
#[derive(Default)]
struct PeerRegistry {
    peers: HashMap<PeerId, PeerState>,
}

impl PeerRegistry {
    /// Register `peer` with empty interests. Returns the replaced state
    /// if the peer was already present.
    fn insert(&mut self, peer: PeerId, conduit: Conduit) -> Option<PeerState> {
        self.peers.insert(
            peer,
            PeerState {
                topics: HashSet::new(),
                conduit,
            },
        )
    }

    fn remove(&mut self, peer: &PeerId) -> Option<PeerState> {
        self.peers.remove(peer)
    }

    fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    fn generation_of(&self, peer: &PeerId) -> Option<u64> {
        self.peers.get(peer).map(|state| state.conduit.generation())
    }

    fn conduit(&self, peer: &PeerId) -> Option<&Conduit> {
        self.peers.get(peer).map(|state| &state.conduit)
    }

    /// Record a subscribe/unsubscribe announce from `peer`. Idempotent.
    fn set_interest(&mut self, peer: &PeerId, topic: &str, joined: bool) {
        if let Some(state) = self.peers.get_mut(peer) {
            if joined {
                state.topics.insert(topic.to_string());
            } else {
                state.topics.remove(topic);
            }
        }
    }

    /// Peers that declared `topic`; the empty string means all peers.
    fn peers_for(&self, topic: &str) -> Vec<PeerId> {
        if topic.is_empty() {
            self.peers.keys().copied().collect()
        } else {
            self.peers
                .iter()
                .filter(|(_, state)| state.topics.contains(topic))
                .map(|(peer, _)| *peer)
                .collect()
        }
    }

    fn broadcast(&self, frame: &Frame) {
        for state in self.peers.values() {
            state.conduit.enqueue(frame.clone());
        }
    }

    fn len(&self) -> usize {
        self.peers.len()
    }

    fn clear(&mut self) {
        self.peers.clear();
    }
}

// ============================================================================
// FloodSub actor (owns state)
// ============================================================================

struct FloodSubActor {
    local_peer: PeerId,
    config: FloodSubConfig,
    table: TopicTable,
    registry: PeerRegistry,
    seen: SeenCache,
    validators: ValidatorPool,
    events: mpsc::Sender<RouterEvent>,
    next_sub_id: u64,
    next_generation: u64,
    seqno: u64,
}

impl FloodSubActor {
    fn new(local_peer: PeerId, config: FloodSubConfig, events: mpsc::Sender<RouterEvent>) -> Self {
        let seen = SeenCache::new(config.seen_capacity, config.seen_ttl);
        let validators = ValidatorPool::new(config.validator_concurrency);
        Self {
            local_peer,
            config,
            table: TopicTable::default(),
            registry: PeerRegistry::default(),
            seen,
            validators,
            events,
            next_sub_id: 0,
            next_generation: 0,
            // Random seed keeps seqnos origin-unique across restarts.
            seqno: rand::thread_rng().gen(),
        }
    }

    async fn run<S>(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut network: mpsc::Receiver<OverlayEvent<S>>,
        mut events: mpsc::Receiver<RouterEvent>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        debug!(peer = ?self.local_peer, "floodsub router started");
        let mut network_open = true;
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                event = network.recv(), if network_open => match event {
                    Some(OverlayEvent::PeerJoined { peer, stream }) => {
                        self.handle_peer_joined(peer, stream);
                    }
                    Some(OverlayEvent::PeerLeft { peer }) => self.handle_peer_left(peer),
                    None => network_open = false,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
        self.finish();
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Subscribe { topic, opts, reply } => {
                let _ = reply.send(self.handle_subscribe(topic, opts));
            }
            Command::Cancel { topic, id } => self.handle_cancel(&topic, id),
            Command::Publish { topic, data, reply } => {
                let _ = reply.send(self.handle_publish(topic, data));
            }
            Command::GetTopics { reply } => {
                let _ = reply.send(self.table.topics());
            }
            Command::ListPeers { topic, reply } => {
                let _ = reply.send(self.registry.peers_for(&topic));
            }
            // Handled by the loop before dispatching here.
            Command::Shutdown => {}
        }
    }

    fn handle_subscribe(
        &mut self,
        topic: String,
        opts: SubscribeOpts,
    ) -> Result<(u64, mpsc::Receiver<Message>)> {
        if topic.is_empty() {
            return Err(MessageRejection::EmptyTopic.into());
        }
        let id = self.next_sub_id;
        self.next_sub_id += 1;

        let (queue_tx, queue_rx) = mpsc::channel(self.config.delivery_queue_capacity);
        let first = self.table.add(
            &topic,
            LocalSub {
                id,
                queue: queue_tx,
                validator: opts.validator,
                validator_timeout: opts
                    .validator_timeout
                    .unwrap_or(self.config.validator_timeout),
            },
        );
        if first {
            debug!(topic = %topic, "announcing topic join");
            self.registry.broadcast(&Frame::announce(&topic, true));
        }
        Ok((id, queue_rx))
    }

    fn handle_cancel(&mut self, topic: &str, id: u64) {
        if self.table.remove(topic, id) {
            debug!(topic = %topic, "announcing topic leave");
            self.registry.broadcast(&Frame::announce(topic, false));
        }
    }

    fn handle_publish(&mut self, topic: String, data: Vec<u8>) -> Result<()> {
        if topic.is_empty() {
            return Err(MessageRejection::EmptyTopic.into());
        }
        if data.len() > MAX_PUBLISH_SIZE {
            return Err(MessageRejection::MessageTooLarge.into());
        }

        self.seqno = self.seqno.wrapping_add(1);
        let message = Message {
            from: self.local_peer,
            seqno: self.seqno.to_be_bytes().to_vec(),
            data,
            topics: vec![topic],
        };
        self.seen.test_and_insert(message.key());
        // Own publications take the same route as inbound traffic, so
        // validators apply and only subscriptions existing now can
        // receive them.
        self.route(None, message);
        Ok(())
    }

    fn handle_peer_joined<S>(&mut self, peer: PeerId, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let generation = self.next_generation;
        self.next_generation += 1;

        let conduit = Conduit::spawn(
            peer,
            generation,
            stream,
            self.config.peer_queue_capacity,
            self.events.clone(),
        );

        // The hello frame: tell the new peer every topic we currently
        // subscribe to, so it can route floods our way.
        let topics = self.table.topics();
        if !topics.is_empty() {
            conduit.enqueue(Frame::hello(topics.iter().map(String::as_str)));
        }

        if self.registry.insert(peer, conduit).is_some() {
            debug!(peer = ?peer, "replaced conduit for reconnected peer");
        } else {
            debug!(peer = ?peer, "peer joined");
        }
    }

    fn handle_peer_left(&mut self, peer: PeerId) {
        if self.registry.remove(&peer).is_some() {
            debug!(peer = ?peer, "peer left");
        }
    }

    fn handle_event(&mut self, event: RouterEvent) {
        match event {
            RouterEvent::Frame { peer, frame } => self.handle_frame(peer, frame),
            RouterEvent::ReadClosed { peer, generation } => {
                // Ignore stragglers from a conduit that was already
                // replaced by a reconnect.
                if self.registry.generation_of(&peer) == Some(generation) {
                    debug!(peer = ?peer, "peer stream closed");
                    self.registry.remove(&peer);
                }
            }
            RouterEvent::Validated {
                source,
                message,
                accepted,
            } => {
                if accepted {
                    self.deliver_and_forward(source, &message);
                } else {
                    trace!(origin = ?message.from, "message rejected by validators");
                }
            }
        }
    }

    fn handle_frame(&mut self, peer: PeerId, frame: Frame) {
        if !self.registry.contains(&peer) {
            warn!(peer = ?peer, "frame from unregistered peer, ignoring");
            return;
        }

        for sub in frame.subscriptions {
            let topic = match sub.topic_id {
                Some(topic) if !topic.is_empty() => topic,
                _ => continue,
            };
            let joined = sub.subscribe.unwrap_or(false);
            trace!(peer = ?peer, topic = %topic, joined, "peer interest update");
            self.registry.set_interest(&peer, &topic, joined);
        }

        for wire_msg in frame.publish {
            let message = match wire_msg.into_message() {
                Some(message) => message,
                None => {
                    warn!(peer = ?peer, "dropping malformed message");
                    continue;
                }
            };
            if message.from == self.local_peer {
                trace!(peer = ?peer, "own message echoed back, dropping");
                continue;
            }
            if !self.seen.test_and_insert(message.key()) {
                trace!(origin = ?message.from, "duplicate message, dropping");
                continue;
            }
            self.route(Some(peer), message);
        }
    }

    /// Route a newly-seen message: directly when no local validator is
    /// interested, otherwise through the validator pool. A saturated
    /// pool drops the message entirely — no delivery, no forward.
    fn route(&mut self, source: Option<PeerId>, message: Message) {
        let mut validators: Vec<(ValidatorFn, Duration)> = Vec::new();
        for topic in &message.topics {
            for sub in self.table.subscribers(topic) {
                if let Some(validator) = &sub.validator {
                    validators.push((validator.clone(), sub.validator_timeout));
                }
            }
        }

        if validators.is_empty() {
            self.deliver_and_forward(source, &message);
        } else {
            self.validators
                .try_run(source, message, validators, self.events.clone());
        }
    }

    fn deliver_and_forward(&mut self, source: Option<PeerId>, message: &Message) {
        // Local delivery to every subscriber of every matching topic.
        for topic in &message.topics {
            for sub in self.table.subscribers(topic) {
                match sub.queue.try_send(message.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        trace!(topic = %topic, sub = sub.id, "delivery queue full, dropping");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        // Cancelled but not yet reaped; the cancel
                        // command removes it shortly.
                    }
                }
            }
        }

        // Fan-out at most once per interested peer, never back toward
        // the peer it arrived from or its origin.
        let frame = Frame::publication(message);
        let mut sent: HashSet<PeerId> = HashSet::new();
        for topic in &message.topics {
            for peer in self.registry.peers_for(topic) {
                if Some(peer) == source || peer == message.from {
                    continue;
                }
                if sent.insert(peer) {
                    if let Some(conduit) = self.registry.conduit(&peer) {
                        conduit.enqueue(frame.clone());
                    }
                }
            }
        }
        trace!(origin = ?message.from, fanout = sent.len(), "message routed");
    }

    fn finish(mut self) {
        let peers = self.registry.len();
        // Dropping conduits aborts their tasks and discards in-flight
        // frames; dropping delivery senders ends every subscription.
        self.registry.clear();
        self.table.clear();
        debug!(peer = ?self.local_peer, peers, "floodsub router stopped");
    }
}
