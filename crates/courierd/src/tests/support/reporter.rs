//! Health reporter that records every lifecycle event for assertions.

use std::sync::Mutex;

use courier_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::{DeliveryOutcome, ShutdownReport};
use crate::health::HealthReporter;
use crate::registry::{AcceptError, ReadError, Registry, Slot};

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Counts the recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&HealthEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, registry: &Registry) {
        self.record(HealthEvent::BootstrapSucceeded {
            slots: registry.len(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn slot_connected(&self, slot: &Slot) {
        self.record(HealthEvent::Connected(slot.name().to_owned()));
    }

    fn slot_disconnected(&self, slot: &Slot) {
        self.record(HealthEvent::Disconnected(slot.name().to_owned()));
    }

    fn accept_failed(&self, error: &AcceptError) {
        self.record(HealthEvent::AcceptFailed(error.name.clone()));
    }

    fn read_failed(&self, error: &ReadError) {
        self.record(HealthEvent::ReadFailed(error.name.clone()));
    }

    fn unit_routed(&self, source: &Slot, outcome: &DeliveryOutcome) {
        let source = source.name().to_owned();
        let event = match outcome {
            DeliveryOutcome::Delivered { destination, bytes } => HealthEvent::Delivered {
                source,
                destination: *destination,
                bytes: *bytes,
            },
            DeliveryOutcome::NoRoute { destination_id } => HealthEvent::Dropped {
                source,
                destination_id: Some(*destination_id),
            },
            DeliveryOutcome::Unroutable { .. } => HealthEvent::Dropped {
                source,
                destination_id: None,
            },
            DeliveryOutcome::WriteFailed { destination, .. } => HealthEvent::WriteFailed {
                source,
                destination: *destination,
            },
        };
        self.record(event);
    }

    fn shutdown_requested(&self, source: &Slot) {
        self.record(HealthEvent::ShutdownRequested(source.name().to_owned()));
    }

    fn shutdown_completed(&self, report: &ShutdownReport) {
        self.record(HealthEvent::ShutdownCompleted {
            released_slots: report.released_slots,
        });
    }
}

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded {
        slots: usize,
    },
    BootstrapFailed(String),
    Connected(String),
    Disconnected(String),
    AcceptFailed(String),
    ReadFailed(String),
    Delivered {
        source: String,
        destination: usize,
        bytes: usize,
    },
    Dropped {
        source: String,
        destination_id: Option<u8>,
    },
    WriteFailed {
        source: String,
        destination: usize,
    },
    ShutdownRequested(String),
    ShutdownCompleted {
        released_slots: usize,
    },
}

impl HealthEvent {
    /// Whether the event records the fate of a data unit.
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            Self::Delivered { .. } | Self::Dropped { .. } | Self::WriteFailed { .. }
        )
    }
}
