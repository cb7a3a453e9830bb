//! Error types for endpoint listener operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding a component endpoint.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("existing unix socket {path} is already in use")]
    UnixInUse { path: String },
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket { path: String },
    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to existing unix socket {path}: {source}")]
    UnixConnect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking accept on {path}: {source}")]
    NonBlocking {
        path: String,
        #[source]
        source: io::Error,
    },
}
