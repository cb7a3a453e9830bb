//! Readiness-driven routing of message units between component slots.
//!
//! Each turn of the loop waits on every slot's current handle, accepts peers
//! on listening slots, and reads one unit from each ready connected slot. A
//! unit is forwarded verbatim to the connected slot named by its destination
//! byte, or dropped when no such slot is connected. A `DOWN` unit from any
//! slot ends the loop.

mod dispatcher;
mod errors;
mod poll;
mod router;

pub use self::dispatcher::{Dispatcher, LoopState, ShutdownReport};
pub use self::errors::{DispatchError, PollError, WriteError};
pub use self::router::{DeliveryOutcome, route};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
