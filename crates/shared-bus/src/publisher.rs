//! # Transport and Publication
//!
//! Defines the publishing side of the transport and the in-memory
//! implementation shared by tests and the demo runtime.

use crate::fragment::{self, Fragment};
use crate::subscriber::{InMemorySubscription, Subscription, TransportError};
use crate::{DEFAULT_MTU, DEFAULT_TERM_BUFFER_LENGTH, FRAME_HEADER_LENGTH};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a non-blocking `offer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// The whole message was appended to every subscriber's buffer.
    Accepted,
    /// At least one subscriber's buffer is full; retry the same message later.
    BackPressured,
    /// No subscriber is attached to the stream yet; retry later.
    NotConnected,
    /// The transport is busy with internal bookkeeping; retry later.
    AdminAction,
    /// The publication or the transport is closed; never succeeds again.
    Closed,
}

impl OfferOutcome {
    /// Returns true if retrying the same message may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OfferOutcome::BackPressured | OfferOutcome::NotConnected | OfferOutcome::AdminAction
        )
    }
}

/// Factory for publications and subscriptions.
pub trait Transport: Send + Sync {
    /// Open a publication on `(channel, stream_id)`.
    ///
    /// # Errors
    ///
    /// - `TransportError::Unavailable` - The transport cannot serve new handles.
    /// - `TransportError::InvalidChannel` - The channel address is not usable.
    fn add_publication(
        &self,
        channel: &str,
        stream_id: i32,
    ) -> Result<Box<dyn Publication>, TransportError>;

    /// Open a subscription on `(channel, stream_id)`.
    ///
    /// # Errors
    ///
    /// Same as [`Transport::add_publication`].
    fn add_subscription(
        &self,
        channel: &str,
        stream_id: i32,
    ) -> Result<Box<dyn Subscription>, TransportError>;
}

/// Publishing handle on one stream.
pub trait Publication: Send {
    /// Offer a message without blocking.
    fn offer(&mut self, message: &[u8]) -> OfferOutcome;

    /// Session id stamped on every fragment of this publication.
    fn session_id(&self) -> i32;

    /// Release the handle. Later offers answer `Closed`.
    fn close(&mut self);

    /// Returns true once the handle or its transport is closed.
    fn is_closed(&self) -> bool;
}

/// In-memory transport configuration.
#[derive(Debug, Clone)]
pub struct InMemoryTransportConfig {
    /// Per-subscriber buffer capacity in bytes. A full buffer back-pressures publishers.
    pub term_buffer_length: usize,
    /// Maximum payload per fragment.
    pub mtu: usize,
}

impl Default for InMemoryTransportConfig {
    fn default() -> Self {
        Self {
            term_buffer_length: DEFAULT_TERM_BUFFER_LENGTH,
            mtu: DEFAULT_MTU,
        }
    }
}

/// Buffered fragments of one subscriber.
pub(crate) struct SubscriberQueue {
    pub(crate) state: Mutex<QueueState>,
    pub(crate) capacity: usize,
    pub(crate) closed: AtomicBool,
}

pub(crate) struct QueueState {
    pub(crate) fragments: VecDeque<Fragment>,
    pub(crate) buffered_bytes: usize,
}

impl SubscriberQueue {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                fragments: VecDeque::new(),
                buffered_bytes: 0,
            }),
            capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns true if `required` more bytes fit.
    ///
    /// An empty queue always accepts, so a message larger than the buffer
    /// still makes progress.
    fn has_room(&self, required: usize) -> bool {
        let state = self.state.lock();
        state.buffered_bytes == 0 || state.buffered_bytes + required <= self.capacity
    }

    fn push(&self, frames: &[Fragment]) {
        let mut state = self.state.lock();
        for frame in frames {
            state.buffered_bytes += frame.payload.len() + FRAME_HEADER_LENGTH;
            state.fragments.push_back(frame.clone());
        }
    }
}

/// Subscribers attached to one `(channel, stream_id)`.
#[derive(Default)]
pub(crate) struct StreamState {
    subscribers: Mutex<Vec<Arc<SubscriberQueue>>>,
}

type StreamKey = (String, i32);

/// In-memory implementation of the transport.
///
/// Every subscription on a stream receives every fragment offered on that
/// stream after it attached, including fragments from publications owned by
/// the same process. Offers on one stream are serialized so fragments of a
/// message are never interleaved with another publication's.
pub struct InMemoryTransport {
    config: InMemoryTransportConfig,
    streams: RwLock<HashMap<StreamKey, Arc<StreamState>>>,
    next_session_id: AtomicI32,
    closed: Arc<AtomicBool>,
    messages_offered: Arc<AtomicU64>,
}

impl InMemoryTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InMemoryTransportConfig::default())
    }

    /// Create a transport with the given configuration.
    #[must_use]
    pub fn with_config(config: InMemoryTransportConfig) -> Self {
        Self {
            config,
            streams: RwLock::new(HashMap::new()),
            next_session_id: AtomicI32::new(1),
            closed: Arc::new(AtomicBool::new(false)),
            messages_offered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shut the transport down. Existing handles observe `Closed`; new ones
    /// are refused.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("In-memory transport closed");
        }
    }

    /// Returns true once [`InMemoryTransport::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions on a stream.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str, stream_id: i32) -> usize {
        self.streams
            .read()
            .get(&(channel.to_string(), stream_id))
            .map(|s| {
                s.subscribers
                    .lock()
                    .iter()
                    .filter(|q| !q.closed.load(Ordering::SeqCst))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Total messages accepted across all streams.
    #[must_use]
    pub fn messages_offered(&self) -> u64 {
        self.messages_offered.load(Ordering::Relaxed)
    }

    /// Get the transport configuration.
    #[must_use]
    pub fn config(&self) -> &InMemoryTransportConfig {
        &self.config
    }

    fn check_open(&self, channel: &str) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Unavailable("transport closed".to_string()));
        }
        if channel.trim().is_empty() {
            return Err(TransportError::InvalidChannel(channel.to_string()));
        }
        Ok(())
    }

    fn stream(&self, channel: &str, stream_id: i32) -> Arc<StreamState> {
        let key = (channel.to_string(), stream_id);
        if let Some(stream) = self.streams.read().get(&key) {
            return stream.clone();
        }
        self.streams.write().entry(key).or_default().clone()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for InMemoryTransport {
    fn add_publication(
        &self,
        channel: &str,
        stream_id: i32,
    ) -> Result<Box<dyn Publication>, TransportError> {
        self.check_open(channel)?;
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        debug!(channel, stream_id, session_id, "Publication added");

        Ok(Box::new(InMemoryPublication {
            session_id,
            stream: self.stream(channel, stream_id),
            mtu: self.config.mtu,
            transport_closed: self.closed.clone(),
            messages_offered: self.messages_offered.clone(),
            closed: false,
            accepted: 0,
        }))
    }

    fn add_subscription(
        &self,
        channel: &str,
        stream_id: i32,
    ) -> Result<Box<dyn Subscription>, TransportError> {
        self.check_open(channel)?;
        let queue = Arc::new(SubscriberQueue::new(self.config.term_buffer_length));
        self.stream(channel, stream_id)
            .subscribers
            .lock()
            .push(queue.clone());
        debug!(channel, stream_id, "Subscription added");

        Ok(Box::new(InMemorySubscription::new(
            queue,
            self.closed.clone(),
        )))
    }
}

/// Publication handle of the in-memory transport.
pub struct InMemoryPublication {
    session_id: i32,
    stream: Arc<StreamState>,
    mtu: usize,
    transport_closed: Arc<AtomicBool>,
    messages_offered: Arc<AtomicU64>,
    closed: bool,
    accepted: u64,
}

impl InMemoryPublication {
    /// Messages accepted by this publication.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted
    }
}

impl Publication for InMemoryPublication {
    fn offer(&mut self, message: &[u8]) -> OfferOutcome {
        if self.is_closed() {
            return OfferOutcome::Closed;
        }

        let frames = fragment::split(self.session_id, message, self.mtu);
        let required: usize = frames
            .iter()
            .map(|f| f.payload.len() + FRAME_HEADER_LENGTH)
            .sum();

        let mut subscribers = self.stream.subscribers.lock();
        subscribers.retain(|q| !q.closed.load(Ordering::SeqCst));
        if subscribers.is_empty() {
            return OfferOutcome::NotConnected;
        }
        if subscribers.iter().any(|q| !q.has_room(required)) {
            return OfferOutcome::BackPressured;
        }
        for queue in subscribers.iter() {
            queue.push(&frames);
        }
        self.accepted += 1;
        self.messages_offered.fetch_add(1, Ordering::Relaxed);
        OfferOutcome::Accepted
    }

    fn session_id(&self) -> i32 {
        self.session_id
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!(session_id = self.session_id, "Publication closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed || self.transport_closed.load(Ordering::SeqCst)
    }
}

impl Drop for InMemoryPublication {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                session_id = self.session_id,
                "Publication dropped without close"
            );
        }
    }
}
