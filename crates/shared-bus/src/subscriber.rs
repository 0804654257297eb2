//! # Subscription
//!
//! Defines the subscribing side of the transport.

use crate::fragment::Fragment;
use crate::publisher::SubscriberQueue;
use crate::FRAME_HEADER_LENGTH;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from transport operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport cannot serve new publications or subscriptions.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// The channel address is not usable.
    #[error("Invalid channel: {0:?}")]
    InvalidChannel(String),

    /// The handle or its transport was closed.
    #[error("Transport closed")]
    Closed,
}

/// Subscribing handle on one stream.
pub trait Subscription: Send {
    /// Take up to `fragment_limit` buffered fragments without blocking.
    ///
    /// # Errors
    ///
    /// - `TransportError::Closed` - The handle or its transport was closed.
    fn poll(&mut self, fragment_limit: usize) -> Result<Vec<Fragment>, TransportError>;

    /// Release the handle. Publishers stop delivering to it.
    fn close(&mut self);
}

/// Subscription handle of the in-memory transport.
pub struct InMemorySubscription {
    queue: Arc<SubscriberQueue>,
    transport_closed: Arc<AtomicBool>,
}

impl InMemorySubscription {
    pub(crate) fn new(queue: Arc<SubscriberQueue>, transport_closed: Arc<AtomicBool>) -> Self {
        Self {
            queue,
            transport_closed,
        }
    }

    /// Bytes currently buffered for this subscription.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.queue.state.lock().buffered_bytes
    }
}

impl Subscription for InMemorySubscription {
    fn poll(&mut self, fragment_limit: usize) -> Result<Vec<Fragment>, TransportError> {
        if self.queue.closed.load(Ordering::SeqCst) || self.transport_closed.load(Ordering::SeqCst)
        {
            return Err(TransportError::Closed);
        }

        let mut state = self.queue.state.lock();
        let take = fragment_limit.min(state.fragments.len());
        let batch: Vec<Fragment> = state.fragments.drain(..take).collect();
        let released: usize = batch
            .iter()
            .map(|f| f.payload.len() + FRAME_HEADER_LENGTH)
            .sum();
        state.buffered_bytes = state.buffered_bytes.saturating_sub(released);
        Ok(batch)
    }

    fn close(&mut self) {
        if !self.queue.closed.swap(true, Ordering::SeqCst) {
            debug!("Subscription closed");
        }
    }
}

impl Drop for InMemorySubscription {
    fn drop(&mut self) {
        self.queue.closed.store(true, Ordering::SeqCst);
    }
}
