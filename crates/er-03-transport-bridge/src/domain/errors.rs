//! # Domain Errors

use shared_bus::TransportError;
use thiserror::Error;

/// Errors raised while starting a bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The transport refused a publication or subscription.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration cannot drive the loops.
    #[error("Invalid bridge configuration: {0}")]
    InvalidConfig(String),
}
