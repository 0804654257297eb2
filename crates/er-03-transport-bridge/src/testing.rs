//! Scripted transport handles for tests.
//!
//! `ScriptedPublication` answers offers from a queue of outcomes and records
//! what it saw; `ScriptedSubscription` serves fragments pushed through a
//! `SubscriptionFeed`. `ScriptedTransport` hands both out once.

use parking_lot::Mutex;
use shared_bus::{
    Fragment, OfferOutcome, Publication, Subscription, Transport, TransportError, UNFRAGMENTED,
};
use std::collections::VecDeque;
use std::sync::Arc;

// =============================================================================
// Publication
// =============================================================================

#[derive(Debug, Default)]
struct ProbeState {
    attempts: Vec<Vec<u8>>,
    accepted: Vec<Vec<u8>>,
    closed: bool,
}

/// Observer for a [`ScriptedPublication`].
#[derive(Debug, Clone, Default)]
pub struct PublicationProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl PublicationProbe {
    /// Every offered message, including retries.
    #[must_use]
    pub fn attempts(&self) -> Vec<Vec<u8>> {
        self.state.lock().attempts.clone()
    }

    /// Messages answered with `Accepted`, in order.
    #[must_use]
    pub fn accepted(&self) -> Vec<Vec<u8>> {
        self.state.lock().accepted.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Publication answering offers from a script.
pub struct ScriptedPublication {
    script: VecDeque<OfferOutcome>,
    fallback: OfferOutcome,
    probe: PublicationProbe,
    session_id: i32,
}

impl ScriptedPublication {
    /// Answer with `script` in order, then `Accepted` forever.
    pub fn new(script: impl IntoIterator<Item = OfferOutcome>) -> (Self, PublicationProbe) {
        Self::from_script(script.into_iter().collect())
    }

    /// Accept every offer.
    pub fn accepting() -> (Self, PublicationProbe) {
        Self::from_script(VecDeque::new())
    }

    fn from_script(script: VecDeque<OfferOutcome>) -> (Self, PublicationProbe) {
        let probe = PublicationProbe::default();
        let publication = Self {
            script,
            fallback: OfferOutcome::Accepted,
            probe: probe.clone(),
            session_id: 1,
        };
        (publication, probe)
    }

    /// Outcome used once the script runs out.
    #[must_use]
    pub fn with_fallback(mut self, outcome: OfferOutcome) -> Self {
        self.fallback = outcome;
        self
    }
}

impl Publication for ScriptedPublication {
    fn offer(&mut self, message: &[u8]) -> OfferOutcome {
        let mut state = self.probe.state.lock();
        if state.closed {
            return OfferOutcome::Closed;
        }
        let outcome = self.script.pop_front().unwrap_or(self.fallback);
        state.attempts.push(message.to_vec());
        if outcome == OfferOutcome::Accepted {
            state.accepted.push(message.to_vec());
        }
        outcome
    }

    fn session_id(&self) -> i32 {
        self.session_id
    }

    fn close(&mut self) {
        self.probe.state.lock().closed = true;
    }

    fn is_closed(&self) -> bool {
        self.probe.state.lock().closed
    }
}

// =============================================================================
// Subscription
// =============================================================================

#[derive(Debug, Default)]
struct FeedState {
    fragments: VecDeque<Fragment>,
    transport_closed: bool,
    released: bool,
}

/// Producer side of a [`ScriptedSubscription`].
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFeed {
    state: Arc<Mutex<FeedState>>,
}

impl SubscriptionFeed {
    pub fn push(&self, fragment: Fragment) {
        self.state.lock().fragments.push_back(fragment);
    }

    /// Push a whole message as one unfragmented frame.
    pub fn push_message(&self, session_id: i32, message: &[u8]) {
        self.push(Fragment::new(session_id, UNFRAGMENTED, message.to_vec()));
    }

    /// Make every later poll fail with `TransportError::Closed`.
    pub fn close_transport(&self) {
        self.state.lock().transport_closed = true;
    }

    /// Returns true once the subscription owner closed its handle.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().fragments.len()
    }
}

/// Subscription serving fragments from a [`SubscriptionFeed`].
pub struct ScriptedSubscription {
    feed: SubscriptionFeed,
}

impl ScriptedSubscription {
    pub fn new() -> (Self, SubscriptionFeed) {
        let feed = SubscriptionFeed::default();
        (Self { feed: feed.clone() }, feed)
    }
}

impl Subscription for ScriptedSubscription {
    fn poll(&mut self, fragment_limit: usize) -> Result<Vec<Fragment>, TransportError> {
        let mut state = self.feed.state.lock();
        if state.transport_closed || state.released {
            return Err(TransportError::Closed);
        }
        let take = fragment_limit.min(state.fragments.len());
        Ok(state.fragments.drain(..take).collect())
    }

    fn close(&mut self) {
        self.feed.state.lock().released = true;
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Transport handing out one prepared publication and subscription.
///
/// Later requests, or requests after `fail_with`, return an error.
#[derive(Default)]
pub struct ScriptedTransport {
    publication: Mutex<Option<ScriptedPublication>>,
    subscription: Mutex<Option<ScriptedSubscription>>,
    failure: Mutex<Option<TransportError>>,
}

impl ScriptedTransport {
    pub fn new(publication: ScriptedPublication, subscription: ScriptedSubscription) -> Self {
        Self {
            publication: Mutex::new(Some(publication)),
            subscription: Mutex::new(Some(subscription)),
            failure: Mutex::new(None),
        }
    }

    /// Refuse every later handle request with `error`.
    pub fn fail_with(&self, error: TransportError) {
        *self.failure.lock() = Some(error);
    }

    fn check(&self) -> Result<(), TransportError> {
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Transport for ScriptedTransport {
    fn add_publication(
        &self,
        _channel: &str,
        _stream_id: i32,
    ) -> Result<Box<dyn Publication>, TransportError> {
        self.check()?;
        self.publication
            .lock()
            .take()
            .map(|p| Box::new(p) as Box<dyn Publication>)
            .ok_or_else(|| TransportError::Unavailable("publication already taken".to_string()))
    }

    fn add_subscription(
        &self,
        _channel: &str,
        _stream_id: i32,
    ) -> Result<Box<dyn Subscription>, TransportError> {
        self.check()?;
        self.subscription
            .lock()
            .take()
            .map(|s| Box::new(s) as Box<dyn Subscription>)
            .ok_or_else(|| TransportError::Unavailable("subscription already taken".to_string()))
    }
}
