//! Structured health reporting for dispatcher lifecycle events.

use std::sync::Arc;

use courier_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::{DeliveryOutcome, ShutdownReport};
use crate::registry::{AcceptError, ReadError, Registry, Slot};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the slot table is built.
    fn bootstrap_starting(&self);

    /// Invoked once every slot is listening.
    fn bootstrap_succeeded(&self, config: &Config, registry: &Registry);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after a peer is accepted on a slot.
    fn slot_connected(&self, slot: &Slot);

    /// Invoked after a slot's peer is released and the slot listens again.
    fn slot_disconnected(&self, slot: &Slot);

    /// Invoked when accepting a peer fails.
    fn accept_failed(&self, error: &AcceptError);

    /// Invoked when reading from a peer fails.
    fn read_failed(&self, error: &ReadError);

    /// Invoked for every data unit read, with what became of it.
    fn unit_routed(&self, source: &Slot, outcome: &DeliveryOutcome);

    /// Invoked when a slot sends the shutdown sentinel.
    fn shutdown_requested(&self, source: &Slot);

    /// Invoked after teardown has released every resource.
    fn shutdown_completed(&self, report: &ShutdownReport);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, registry: &Registry) {
        (**self).bootstrap_succeeded(config, registry);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn slot_connected(&self, slot: &Slot) {
        (**self).slot_connected(slot);
    }

    fn slot_disconnected(&self, slot: &Slot) {
        (**self).slot_disconnected(slot);
    }

    fn accept_failed(&self, error: &AcceptError) {
        (**self).accept_failed(error);
    }

    fn read_failed(&self, error: &ReadError) {
        (**self).read_failed(error);
    }

    fn unit_routed(&self, source: &Slot, outcome: &DeliveryOutcome) {
        (**self).unit_routed(source, outcome);
    }

    fn shutdown_requested(&self, source: &Slot) {
        (**self).shutdown_requested(source);
    }

    fn shutdown_completed(&self, report: &ShutdownReport) {
        (**self).shutdown_completed(report);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting dispatcher bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, registry: &Registry) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            sockets = %config.socket_layout(),
            slots = registry.len(),
            poll_timeout_ms = config.poll_timeout_ms,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "dispatcher bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "dispatcher bootstrap failed"
        );
    }

    fn slot_connected(&self, slot: &Slot) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "slot_connected",
            component = %slot.kind(),
            name = slot.name(),
            "component connected"
        );
    }

    fn slot_disconnected(&self, slot: &Slot) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "slot_disconnected",
            component = %slot.kind(),
            name = slot.name(),
            "component disconnected"
        );
    }

    fn accept_failed(&self, error: &AcceptError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "accept_failed",
            name = %error.name,
            error = %error.source,
            "failed to accept component connection"
        );
    }

    fn read_failed(&self, error: &ReadError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "read_failed",
            name = %error.name,
            error = %error.source,
            "read failed; treating as disconnect"
        );
    }

    fn unit_routed(&self, source: &Slot, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered { destination, bytes } => tracing::debug!(
                target: HEALTH_TARGET,
                event = "unit_delivered",
                source = source.name(),
                destination,
                bytes,
                "unit forwarded"
            ),
            DeliveryOutcome::NoRoute { destination_id } => tracing::debug!(
                target: HEALTH_TARGET,
                event = "unit_dropped",
                source = source.name(),
                destination_id,
                "no connected destination; unit dropped"
            ),
            DeliveryOutcome::Unroutable { len } => tracing::debug!(
                target: HEALTH_TARGET,
                event = "unit_dropped",
                source = source.name(),
                len,
                "unit too short to route; dropped"
            ),
            DeliveryOutcome::WriteFailed { destination, error } => tracing::warn!(
                target: HEALTH_TARGET,
                event = "write_failed",
                source = source.name(),
                destination,
                error = %error,
                "forwarding failed; unit dropped"
            ),
        }
    }

    fn shutdown_requested(&self, source: &Slot) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_requested",
            name = source.name(),
            "received DOWN; dispatcher shutting down"
        );
    }

    fn shutdown_completed(&self, report: &ShutdownReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_completed",
            released_slots = report.released_slots,
            released_connections = report.released_connections,
            requested_by = report.requested_by.as_deref().unwrap_or("none"),
            "dispatcher resources released"
        );
    }
}
