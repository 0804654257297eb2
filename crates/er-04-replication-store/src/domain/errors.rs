//! # Domain Errors

use er_03_transport_bridge::BridgeError;
use shared_types::{ComponentId, ValueError};
use thiserror::Error;

/// Replication store error types.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// `connect()` called while a session is live.
    #[error("Replication store is already connected")]
    AlreadyConnected,

    /// The transport session could not be opened.
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(#[source] BridgeError),

    /// The component id has no registry entry. Nothing was written.
    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// The value does not fit the component. Nothing was written.
    #[error("Component {component} rejected value: {source}")]
    TypeMismatch {
        component: ComponentId,
        #[source]
        source: ValueError,
    },
}
