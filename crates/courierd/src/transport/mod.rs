//! Unix socket endpoints for component connections.
//!
//! Each component slot owns one listening endpoint for the lifetime of the
//! process. Accepting and reading are driven by the dispatch loop; this module
//! only binds, accepts, and cleans up socket files.

mod errors;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::listener::EndpointListener;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
