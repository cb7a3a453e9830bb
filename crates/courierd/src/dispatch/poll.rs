//! Readiness multiplexing over the slot table.

use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, poll};

use super::PollError;
use crate::registry::Slot;

/// Conditions that make a slot worth servicing. Hang-up and error are
/// included so a vanished peer is noticed through the read path.
const READABLE: PollFlags = PollFlags::POLLIN
    .union(PollFlags::POLLHUP)
    .union(PollFlags::POLLERR);

/// Per-iteration readiness, indexed like the registry.
#[derive(Debug)]
pub(crate) struct PollSet {
    timeout_ms: u16,
    ready: Vec<bool>,
}

impl PollSet {
    pub(crate) fn new(timeout: Duration, capacity: usize) -> Result<Self, PollError> {
        let millis = u16::try_from(timeout.as_millis()).map_err(|_| PollError::Timeout {
            millis: timeout.as_millis(),
        })?;
        Ok(Self {
            timeout_ms: millis,
            ready: Vec::with_capacity(capacity),
        })
    }

    /// Blocks until at least one slot is ready or the timeout elapses, then
    /// records which slots reported readiness. Returns the ready count.
    pub(crate) fn wait(&mut self, slots: &[Slot]) -> Result<usize, PollError> {
        let mut fds: Vec<PollFd<'_>> = slots
            .iter()
            .map(|slot| PollFd::new(slot.pollable(), PollFlags::POLLIN))
            .collect();

        let count = loop {
            match poll(&mut fds, self.timeout_ms) {
                Ok(count) => break count,
                Err(Errno::EINTR) => continue,
                Err(source) => return Err(PollError::Wait { source }),
            }
        };

        self.ready.clear();
        self.ready.extend(
            fds.iter()
                .map(|fd| fd.revents().is_some_and(|events| events.intersects(READABLE))),
        );
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Whether the slot at `index` reported readiness in the last wait.
    pub(crate) fn is_ready(&self, index: usize) -> bool {
        self.ready.get(index).copied().unwrap_or(false)
    }
}
