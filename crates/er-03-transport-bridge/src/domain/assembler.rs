//! # Fragment Assembler
//!
//! Rebuilds whole messages from transport fragments, one buffer per
//! publisher session. Only complete messages leave the assembler.
//!
//! State is bounded: at most `max_partials` messages are in flight (the
//! oldest is evicted), and the set of known sessions is pruned to those
//! with a message in flight once it reaches `max_sessions`.

use shared_bus::Fragment;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Default cap on messages being reassembled at once.
pub const DEFAULT_MAX_PARTIALS: usize = 64;

/// Default cap on remembered publisher sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Partial {
    data: Vec<u8>,
    fragments: u64,
    started: u64,
}

/// Per-session reassembly state.
pub struct FragmentAssembler {
    partials: HashMap<i32, Partial>,
    sessions: HashSet<i32>,
    dropped_fragments: u64,
    next_start: u64,
    max_partials: usize,
    max_sessions: usize,
}

impl Default for FragmentAssembler {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_PARTIALS, DEFAULT_MAX_SESSIONS)
    }
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler with explicit caps. Zero caps are raised to one.
    pub fn with_limits(max_partials: usize, max_sessions: usize) -> Self {
        Self {
            partials: HashMap::new(),
            sessions: HashSet::new(),
            dropped_fragments: 0,
            next_start: 0,
            max_partials: max_partials.max(1),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Feed one fragment; returns a message once its last fragment arrives.
    pub fn on_fragment(&mut self, fragment: Fragment) -> Option<Vec<u8>> {
        let session_id = fragment.session_id;
        self.note_session(session_id);

        if fragment.is_begin() {
            if let Some(stale) = self.partials.remove(&session_id) {
                self.discard(session_id, stale.fragments, "message restarted before its end");
            }
            if fragment.is_end() {
                return Some(fragment.payload);
            }
            self.make_room();
            let started = self.next_start;
            self.next_start += 1;
            self.partials.insert(
                session_id,
                Partial {
                    data: fragment.payload,
                    fragments: 1,
                    started,
                },
            );
            return None;
        }

        let Some(partial) = self.partials.get_mut(&session_id) else {
            self.discard(session_id, 1, "continuation without a beginning");
            return None;
        };
        partial.data.extend_from_slice(&fragment.payload);
        partial.fragments += 1;

        if fragment.is_end() {
            self.partials.remove(&session_id).map(|p| p.data)
        } else {
            None
        }
    }

    /// Fragments discarded because their message could not be completed.
    #[must_use]
    pub fn dropped_fragments(&self) -> u64 {
        self.dropped_fragments
    }

    /// Sessions currently remembered.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Messages currently being reassembled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.partials.len()
    }

    fn note_session(&mut self, session_id: i32) {
        if self.sessions.contains(&session_id) {
            return;
        }
        if self.sessions.len() >= self.max_sessions {
            let partials = &self.partials;
            self.sessions.retain(|s| partials.contains_key(s));
        }
        self.sessions.insert(session_id);
        info!(session_id, "Publisher available");
    }

    /// Evict the oldest in-flight message when at the cap.
    fn make_room(&mut self) {
        if self.partials.len() < self.max_partials {
            return;
        }
        let oldest = self
            .partials
            .iter()
            .min_by_key(|(_, p)| p.started)
            .map(|(&session, _)| session);
        if let Some(session_id) = oldest {
            if let Some(evicted) = self.partials.remove(&session_id) {
                self.discard(session_id, evicted.fragments, "evicted to bound reassembly state");
            }
        }
    }

    fn discard(&mut self, session_id: i32, fragments: u64, reason: &'static str) {
        self.dropped_fragments += fragments;
        debug!(session_id, fragments, reason, "Dropped incomplete message");
    }
}
