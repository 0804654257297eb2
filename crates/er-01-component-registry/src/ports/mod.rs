//! Ports for the Component Registry.

pub mod inbound;
