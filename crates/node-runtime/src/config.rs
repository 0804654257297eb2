//! # Node Configuration
//!
//! Settings of the demo node, read from `ER_*` environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ER_CHANNEL` | `mem://entity-relay` | Transport channel shared by both workers |
//! | `ER_STREAM_ID` | `1001` | Stream within the channel |
//! | `ER_ORIGIN_A` / `ER_ORIGIN_B` | random | Fixed origin ids (decimal or `0x` hex) |
//! | `ER_DEMO_UPDATES` | `10` | Component writes made by worker A |
//! | `ER_CONVERGE_TIMEOUT_MS` | `2000` | How long to wait for worker B to catch up |
//!
//! Logging variables (`ER_LOG_LEVEL`, `ER_JSON_LOGS`, ...) are read by
//! `TelemetryConfig::from_env`.

use std::env;
use std::time::Duration;

use er_03_transport_bridge::BridgeConfig;
use er_04_replication_store::StoreConfig;
use relay_telemetry::TelemetryConfig;
use shared_types::OriginId;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but does not parse.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    /// Both workers were given the same origin id.
    #[error("Workers must have distinct origin ids, both are {0}")]
    DuplicateOrigin(OriginId),
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Transport address and loop tuning shared by both workers.
    pub bridge: BridgeConfig,
    /// Origin of worker A. Random when `None`.
    pub origin_a: Option<OriginId>,
    /// Origin of worker B. Random when `None`.
    pub origin_b: Option<OriginId>,
    /// Component writes made by worker A.
    pub demo_updates: u32,
    /// Upper bound on waiting for worker B to reflect A's writes.
    pub converge_timeout: Duration,
    /// Logging setup.
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            origin_a: None,
            origin_b: None,
            demo_updates: 10,
            converge_timeout: Duration::from_millis(2000),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - A variable does not parse.
    /// - `ConfigError::DuplicateOrigin` - `ER_ORIGIN_A` equals `ER_ORIGIN_B`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|name| env::var(name).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`NodeConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(channel) = lookup("ER_CHANNEL") {
            config.bridge.channel = channel;
        }
        if let Some(value) = lookup("ER_STREAM_ID") {
            config.bridge.stream_id = parse("ER_STREAM_ID", &value, |v| v.parse().ok())?;
        }
        if let Some(value) = lookup("ER_ORIGIN_A") {
            config.origin_a = Some(parse("ER_ORIGIN_A", &value, parse_origin)?);
        }
        if let Some(value) = lookup("ER_ORIGIN_B") {
            config.origin_b = Some(parse("ER_ORIGIN_B", &value, parse_origin)?);
        }
        if let Some(value) = lookup("ER_DEMO_UPDATES") {
            config.demo_updates = parse("ER_DEMO_UPDATES", &value, |v| v.parse().ok())?;
        }
        if let Some(value) = lookup("ER_CONVERGE_TIMEOUT_MS") {
            let millis: u64 = parse("ER_CONVERGE_TIMEOUT_MS", &value, |v| v.parse().ok())?;
            config.converge_timeout = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the demo meaningless.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DuplicateOrigin` - Both workers share one origin id,
    ///   so each would discard the other's updates as its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.origin_a, self.origin_b) {
            (Some(a), Some(b)) if a == b => Err(ConfigError::DuplicateOrigin(a)),
            _ => Ok(()),
        }
    }

    /// Store configuration for one worker.
    pub fn store_config(&self, origin_id: Option<OriginId>) -> StoreConfig {
        StoreConfig {
            origin_id,
            bridge: self.bridge.clone(),
        }
    }
}

fn parse<T>(
    name: &'static str,
    value: &str,
    parser: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    parser(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_origin(value: &str) -> Option<OriginId> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    };
    parsed.map(OriginId)
}
