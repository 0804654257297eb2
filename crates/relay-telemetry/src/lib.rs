//! # Relay Telemetry
//!
//! Logging and metrics bootstrap for Entity Relay processes.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter` and a pretty or JSON
//!   `fmt` layer
//! - **Metrics**: Prometheus gauges fed from `StoreStats` snapshots, rendered
//!   in the text exposition format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! relay_telemetry::record_store_stats(&store.stats());
//! println!("{}", relay_telemetry::gather_text()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ER_SERVICE_NAME` | `entity-relay` | Service name on log lines |
//! | `ER_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `ER_JSON_LOGS` | `false` | JSON log lines instead of pretty output |
//! | `ER_CONSOLE_OUTPUT` | `true` | Write log lines to stdout |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_text, record_store_stats, register_metrics, BRIDGE_BACKPRESSURE_RETRIES,
    BRIDGE_DROPPED_FRAGMENTS, BRIDGE_MESSAGES_RECEIVED, BRIDGE_MESSAGES_SENT, CODEC_DECODED,
    CODEC_DROPPED, STORE_CONNECTED, STORE_ENTITIES, STORE_ENVELOPES_APPLIED,
    STORE_ENVELOPES_ENQUEUED, STORE_LOCAL_WRITES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
///
/// # Errors
///
/// - `TelemetryError::Config` - The log filter does not parse.
/// - `TelemetryError::LoggingInit` - A global subscriber is already set.
/// - `TelemetryError::MetricsInit` - Metric registration failed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
