//! # Backoff Idle Strategy
//!
//! Progressive backoff for loops over non-blocking operations: busy-spin,
//! then yield to the scheduler, then park with a doubling duration.

use super::config::IdleConfig;
use std::time::Duration;

/// Current phase of a [`BackoffIdle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePhase {
    /// Work was done since the last idle.
    NotIdle,
    Spinning,
    Yielding,
    Parking,
}

/// Spin → yield → park backoff.
#[derive(Debug, Clone)]
pub struct BackoffIdle {
    config: IdleConfig,
    phase: IdlePhase,
    spins: u64,
    yields: u64,
    park: Duration,
}

impl BackoffIdle {
    pub fn new(config: IdleConfig) -> Self {
        let park = config.min_park;
        Self {
            config,
            phase: IdlePhase::NotIdle,
            spins: 0,
            yields: 0,
            park,
        }
    }

    #[must_use]
    pub fn phase(&self) -> IdlePhase {
        self.phase
    }

    /// Duration of the next park.
    #[must_use]
    pub fn park_period(&self) -> Duration {
        self.park
    }

    /// Return to the spin phase.
    pub fn reset(&mut self) {
        self.phase = IdlePhase::NotIdle;
        self.spins = 0;
        self.yields = 0;
        self.park = self.config.min_park;
    }

    /// Reset when `work_count > 0`, otherwise back off one step.
    pub async fn idle_with(&mut self, work_count: usize) {
        if work_count > 0 {
            self.reset();
        } else {
            self.idle().await;
        }
    }

    /// Back off one step.
    pub async fn idle(&mut self) {
        match self.phase {
            IdlePhase::NotIdle => {
                self.phase = IdlePhase::Spinning;
                self.spins += 1;
                std::hint::spin_loop();
            }
            IdlePhase::Spinning => {
                std::hint::spin_loop();
                self.spins += 1;
                if self.spins > self.config.max_spins {
                    self.phase = IdlePhase::Yielding;
                    self.yields = 0;
                }
            }
            IdlePhase::Yielding => {
                self.yields += 1;
                if self.yields > self.config.max_yields {
                    self.phase = IdlePhase::Parking;
                    self.park = self.config.min_park;
                } else {
                    tokio::task::yield_now().await;
                }
            }
            IdlePhase::Parking => {
                tokio::time::sleep(self.park).await;
                self.park = (self.park * 2).min(self.config.max_park);
            }
        }
    }
}

impl Default for BackoffIdle {
    fn default() -> Self {
        Self::new(IdleConfig::default())
    }
}
