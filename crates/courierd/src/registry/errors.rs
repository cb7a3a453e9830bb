//! Errors raised while building slots or servicing their connections.

use std::io;

use thiserror::Error;

use super::ComponentKind;
use crate::transport::ListenerError;

/// Failures while creating the slot table. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The component endpoint could not be bound.
    #[error("failed to create endpoint for {name}: {source}")]
    Endpoint {
        name: String,
        #[source]
        source: ListenerError,
    },
    /// A second slot claimed an identity that is already served.
    #[error("component {kind} is already served by slot '{existing}'")]
    DuplicateComponent {
        kind: ComponentKind,
        existing: String,
    },
}

/// Accepting a peer failed; the slot stays listening.
#[derive(Debug, Error)]
#[error("failed to accept connection for {name}: {source}")]
pub struct AcceptError {
    pub name: String,
    #[source]
    pub source: io::Error,
}

/// Reading from a connected peer failed; the slot is returned to listening.
#[derive(Debug, Error)]
#[error("failed to read from {name}: {source}")]
pub struct ReadError {
    pub name: String,
    #[source]
    pub source: io::Error,
}
