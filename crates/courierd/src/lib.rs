//! Onboard message dispatcher for the flight-software component set.
//!
//! Every component (communications, power, attitude control, the operator
//! shell and so on) connects to its own local stream endpoint. The dispatcher
//! runs a single-threaded readiness loop over the fixed slot table: it accepts
//! at most one peer per slot, reads one fixed-size message unit per ready
//! connection, and forwards the unit unchanged to the slot named by the unit's
//! destination byte. Units for components that are not connected are dropped
//! silently. A unit whose text is `DOWN` from any component ends the loop and
//! releases every endpoint.
//!
//! The bootstrap sequence loads [`courier_config::Config`], installs
//! structured telemetry, prepares the socket directory and binds every slot
//! before the loop starts. Lifecycle events are emitted through the
//! [`HealthReporter`] observer so operators can follow connections and drops
//! in the flight log.

mod bootstrap;
mod dispatch;
mod health;
mod message;
mod registry;
mod telemetry;
mod transport;

pub use bootstrap::{BootstrapError, RunError, bootstrap_with, run_dispatcher};
pub use dispatch::{
    DeliveryOutcome, DispatchError, Dispatcher, LoopState, PollError, ShutdownReport, WriteError,
    route,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use message::{
    DEST_INDEX, HEADER_SIZE, MESSAGE_UNIT_SIZE, MessageHeader, SHUTDOWN_SENTINEL, destination_id,
    is_shutdown_sentinel,
};
pub use registry::{
    AcceptError, ComponentKind, ComponentSpec, DEFAULT_COMPONENTS, ReadError, Registry,
    RegistryError, Slot, SlotState, UnknownComponent,
};
pub use telemetry::{TelemetryError, TelemetryHandle, is_initialised as telemetry_initialised};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
