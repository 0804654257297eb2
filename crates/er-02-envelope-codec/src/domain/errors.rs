//! # Domain Errors

use shared_types::{ComponentId, ValueError};
use thiserror::Error;

/// Codec error types.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The envelope could not be serialized.
    #[error("Envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The value would not decode back to itself on a receiver.
    #[error("Component {component} value cannot be encoded: {source}")]
    Unrepresentable {
        component: ComponentId,
        #[source]
        source: ValueError,
    },
}
