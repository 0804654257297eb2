//! # Loop Outcomes and Counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Why a bridge loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Shutdown was signalled.
    Cancelled,
    /// The outbound source has no more items.
    SourceExhausted,
    /// The inbound sink's receiver is gone.
    SinkClosed,
    /// The transport reported the handle closed. Raises the bridge fault.
    TransportClosed,
    /// The task panicked or was aborted.
    Failed,
}

/// Counters shared by both loops of one bridge.
#[derive(Debug, Default)]
pub struct LoopCounters {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    backpressure_retries: AtomicU64,
    dropped_fragments: AtomicU64,
}

impl LoopCounters {
    pub(crate) fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.backpressure_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_dropped_fragments(&self, total: u64) {
        self.dropped_fragments.store(total, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> LoopStats {
        LoopStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            backpressure_retries: self.backpressure_retries.load(Ordering::Relaxed),
            dropped_fragments: self.dropped_fragments.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`LoopCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Messages accepted by the publication.
    pub messages_sent: u64,
    /// Complete messages handed to the inbound sink.
    pub messages_received: u64,
    /// Offers answered with a retryable outcome.
    pub backpressure_retries: u64,
    /// Fragments discarded by reassembly.
    pub dropped_fragments: u64,
}

/// Final state of a bridge after shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeReport {
    pub outbound: LoopExit,
    pub inbound: LoopExit,
    pub stats: LoopStats,
}
