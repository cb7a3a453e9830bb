//! Error types for the dispatch loop.
//!
//! Only multiplexer failures escape the loop. Per-connection failures are
//! reported through [`crate::HealthReporter`] and contained to their slot.

use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// The readiness wait could not be performed.
#[derive(Debug, Error)]
pub enum PollError {
    /// The configured timeout does not fit the multiplexer.
    #[error("poll timeout of {millis} ms is out of range")]
    Timeout { millis: u128 },
    /// The wait primitive itself failed.
    #[error("polling component sockets failed: {source}")]
    Wait {
        #[source]
        source: Errno,
    },
}

/// Forwarding a unit to its destination failed; the unit is dropped.
#[derive(Debug, Error)]
#[error("write to {destination} failed after {written} of {expected} bytes: {source}")]
pub struct WriteError {
    pub destination: String,
    pub written: usize,
    pub expected: usize,
    #[source]
    pub source: io::Error,
}

/// Fatal dispatch loop failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Readiness could not be determined; the loop cannot continue.
    #[error(transparent)]
    Poll(#[from] PollError),
}
