//! # Codec Counters
//!
//! Per-reason drop counters. Every decoded or discarded message increments
//! exactly one of them.

use shared_types::DecodeRejection;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, shared by every decode call of one codec.
#[derive(Debug, Default)]
pub struct CodecStats {
    encoded: AtomicU64,
    decoded: AtomicU64,
    malformed: AtomicU64,
    unknown_component: AtomicU64,
    self_origin: AtomicU64,
    type_mismatch: AtomicU64,
}

/// Point-in-time copy of [`CodecStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecStatsSnapshot {
    pub encoded: u64,
    pub decoded: u64,
    pub malformed: u64,
    pub unknown_component: u64,
    pub self_origin: u64,
    pub type_mismatch: u64,
}

impl CodecStatsSnapshot {
    /// Messages discarded for any reason.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.malformed + self.unknown_component + self.self_origin + self.type_mismatch
    }
}

impl CodecStats {
    pub(crate) fn record_encoded(&self) {
        self.encoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self, rejection: &DecodeRejection) {
        let counter = match rejection {
            DecodeRejection::Malformed(_) => &self.malformed,
            DecodeRejection::UnknownComponent(_) => &self.unknown_component,
            DecodeRejection::SelfOrigin(_) => &self.self_origin,
            DecodeRejection::TypeMismatch { .. } => &self.type_mismatch,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> CodecStatsSnapshot {
        CodecStatsSnapshot {
            encoded: self.encoded.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown_component: self.unknown_component.load(Ordering::Relaxed),
            self_origin: self.self_origin.load(Ordering::Relaxed),
            type_mismatch: self.type_mismatch.load(Ordering::Relaxed),
        }
    }
}
