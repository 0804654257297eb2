//! # Bridge Configuration

use super::errors::BridgeError;
use std::time::Duration;

/// Default staging buffer capacity for outbound messages.
pub const DEFAULT_BUFFER_SIZE_BYTES: usize = 1024;

/// Default maximum fragments taken per poll.
pub const DEFAULT_FRAGMENT_LIMIT: usize = 10;

/// Backoff idle strategy parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleConfig {
    /// Idles spent busy-spinning before yielding.
    pub max_spins: u64,
    /// Idles spent yielding to the scheduler before parking.
    pub max_yields: u64,
    /// First park duration.
    pub min_park: Duration,
    /// Park duration ceiling. Also bounds how long a loop takes to notice shutdown.
    pub max_park: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            max_spins: 100,
            max_yields: 10,
            min_park: Duration::from_micros(1),
            max_park: Duration::from_micros(100),
        }
    }
}

/// Transport bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Transport channel address.
    pub channel: String,
    /// Stream within the channel.
    pub stream_id: i32,
    /// Initial capacity of the outbound staging buffer. Larger messages grow it.
    pub buffer_size_bytes: usize,
    /// Idle strategy used by both loops.
    pub idle: IdleConfig,
    /// Maximum fragments taken per subscription poll.
    pub fragment_limit: usize,
}

impl BridgeConfig {
    pub fn new(channel: impl Into<String>, stream_id: i32) -> Self {
        Self {
            channel: channel.into(),
            stream_id,
            ..Self::default()
        }
    }

    /// Check the settings the loops depend on.
    ///
    /// # Errors
    ///
    /// - `BridgeError::InvalidConfig` - `fragment_limit` is zero, `min_park`
    ///   is zero (parking would never back off) or `max_park < min_park`.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.fragment_limit == 0 {
            return Err(BridgeError::InvalidConfig(
                "fragment_limit must be positive".to_string(),
            ));
        }
        if self.idle.min_park.is_zero() {
            return Err(BridgeError::InvalidConfig(
                "idle.min_park must be positive".to_string(),
            ));
        }
        if self.idle.max_park < self.idle.min_park {
            return Err(BridgeError::InvalidConfig(format!(
                "idle.max_park ({:?}) is below idle.min_park ({:?})",
                self.idle.max_park, self.idle.min_park
            )));
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel: "mem://entity-relay".to_string(),
            stream_id: 1001,
            buffer_size_bytes: DEFAULT_BUFFER_SIZE_BYTES,
            idle: IdleConfig::default(),
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }
}
