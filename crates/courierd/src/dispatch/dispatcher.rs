//! The single-threaded dispatch loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use super::poll::PollSet;
use super::router;
use super::{DISPATCH_TARGET, DispatchError};
use crate::health::HealthReporter;
use crate::message::{MessageHeader, ScratchBuffer, is_shutdown_sentinel};
use crate::registry::{AcceptOutcome, Registry, SlotState};

/// Loop state. `ShuttingDown` is entered only when a slot sends `DOWN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// Summary of the resources released by [`Dispatcher::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Slots whose endpoints were closed.
    pub released_slots: usize,
    /// Peer connections that were still open at teardown.
    pub released_connections: usize,
    /// Name of the slot that sent the sentinel, if any.
    pub requested_by: Option<String>,
}

enum SlotStep {
    Continue,
    Shutdown,
}

/// Owns the registry, poll set, and scratch buffer for the process lifetime.
///
/// All state is mutated only between readiness waits; nothing here is shared
/// across threads.
pub struct Dispatcher {
    registry: Registry,
    poll_set: PollSet,
    buffer: ScratchBuffer,
    state: LoopState,
    requested_by: Option<String>,
    reporter: Arc<dyn HealthReporter>,
}

impl Dispatcher {
    /// Builds the dispatch context around an already-bound registry.
    pub fn new(
        registry: Registry,
        poll_timeout: Duration,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<Self, DispatchError> {
        let poll_set = PollSet::new(poll_timeout, registry.len())?;
        Ok(Self {
            registry,
            poll_set,
            buffer: ScratchBuffer::new(),
            state: LoopState::Running,
            requested_by: None,
            reporter,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs until a slot sends `DOWN`, then tears everything down.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Poll`] if readiness cannot be determined. The
    /// dispatcher's resources are released as it is dropped.
    pub fn run(mut self) -> Result<ShutdownReport, DispatchError> {
        info!(
            target: DISPATCH_TARGET,
            slots = self.registry.len(),
            "dispatch loop running"
        );
        while self.turn()? == LoopState::Running {}
        Ok(self.shutdown())
    }

    /// Performs one iteration: wait for readiness, then service every ready
    /// slot in registry order.
    pub fn turn(&mut self) -> Result<LoopState, DispatchError> {
        if self.state == LoopState::ShuttingDown {
            return Ok(self.state);
        }

        let ready = self.poll_set.wait(self.registry.all_slots())?;
        if ready == 0 {
            trace!(target: DISPATCH_TARGET, "poll timed out");
            return Ok(self.state);
        }

        for index in 0..self.registry.len() {
            if !self.poll_set.is_ready(index) {
                continue;
            }
            let Some(state) = self.registry.slot(index).map(|slot| slot.state()) else {
                continue;
            };
            let step = match state {
                SlotState::Listening => {
                    self.accept(index);
                    SlotStep::Continue
                }
                SlotState::Connected => self.service(index),
            };
            if matches!(step, SlotStep::Shutdown) {
                self.state = LoopState::ShuttingDown;
                break;
            }
        }
        Ok(self.state)
    }

    /// Releases every connection and endpoint. This is the only teardown
    /// path; dropping the dispatcher performs the same release silently.
    pub fn shutdown(self) -> ShutdownReport {
        let Self {
            registry,
            buffer,
            poll_set,
            requested_by,
            reporter,
            ..
        } = self;
        let (released_slots, released_connections) = registry.teardown();
        drop(poll_set);
        drop(buffer);
        let report = ShutdownReport {
            released_slots,
            released_connections,
            requested_by,
        };
        reporter.shutdown_completed(&report);
        report
    }

    fn accept(&mut self, index: usize) {
        let Some(slot) = self.registry.slot_mut(index) else {
            return;
        };
        match slot.accept() {
            Ok(AcceptOutcome::Connected) => self.reporter.slot_connected(slot),
            Ok(AcceptOutcome::NothingPending | AcceptOutcome::AlreadyConnected) => {
                trace!(
                    target: DISPATCH_TARGET,
                    name = slot.name(),
                    "spurious accept readiness"
                );
            }
            Err(error) => self.reporter.accept_failed(&error),
        }
    }

    fn service(&mut self, index: usize) -> SlotStep {
        let Some(slot) = self.registry.slot_mut(index) else {
            return SlotStep::Continue;
        };

        let read = match slot.read_unit(self.buffer.as_mut_slice()) {
            Ok(None) => {
                trace!(
                    target: DISPATCH_TARGET,
                    name = slot.name(),
                    "spurious read readiness"
                );
                return SlotStep::Continue;
            }
            Ok(Some(0)) => {
                slot.release_connection();
                self.reporter.slot_disconnected(slot);
                return SlotStep::Continue;
            }
            Ok(Some(read)) => read,
            Err(error) => {
                self.reporter.read_failed(&error);
                slot.release_connection();
                self.reporter.slot_disconnected(slot);
                return SlotStep::Continue;
            }
        };

        let unit = self.buffer.filled(read);
        if is_shutdown_sentinel(unit) {
            self.reporter.shutdown_requested(slot);
            self.requested_by = Some(slot.name().to_owned());
            self.buffer.clear();
            return SlotStep::Shutdown;
        }

        if let Some(header) = MessageHeader::parse(unit) {
            debug!(
                target: DISPATCH_TARGET,
                source = slot.name(),
                bytes = read,
                %header,
                "unit received"
            );
        }

        let outcome = router::deliver(&mut self.registry, unit);
        if let Some(source) = self.registry.slot(index) {
            self.reporter.unit_routed(source, &outcome);
        }
        self.buffer.clear();
        SlotStep::Continue
    }
}
