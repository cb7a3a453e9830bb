//! Destination lookup and forwarding.
//!
//! Routing is a linear scan over the slot table: slot counts are small and
//! fixed, and identities are unique by construction, so at most one slot can
//! match.

use std::io::{self, Write};

use tracing::trace;

use super::{DISPATCH_TARGET, WriteError};
use crate::message::destination_id;
use crate::registry::{Registry, Slot};

/// What happened to a unit after it was read.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Every byte was written to the destination.
    Delivered { destination: usize, bytes: usize },
    /// No connected slot serves the destination identifier.
    NoRoute { destination_id: u8 },
    /// The unit was too short to carry a destination identifier.
    Unroutable { len: usize },
    /// Writing to the destination failed; the unit was dropped.
    WriteFailed {
        destination: usize,
        error: WriteError,
    },
}

impl DeliveryOutcome {
    /// Whether any byte of the unit reached a destination.
    #[must_use]
    pub fn wrote_anything(&self) -> bool {
        match self {
            Self::Delivered { .. } => true,
            Self::WriteFailed { error, .. } => error.written > 0,
            Self::NoRoute { .. } | Self::Unroutable { .. } => false,
        }
    }
}

/// Index of the connected slot whose identity equals `destination_id`.
#[must_use]
pub fn route(destination_id: u8, slots: &[Slot]) -> Option<usize> {
    slots
        .iter()
        .position(|slot| slot.kind().id() == destination_id && slot.is_connected())
}

/// Resolves the unit's destination and forwards it verbatim.
pub(crate) fn deliver(registry: &mut Registry, unit: &[u8]) -> DeliveryOutcome {
    let Some(destination_id) = destination_id(unit) else {
        return DeliveryOutcome::Unroutable { len: unit.len() };
    };
    let Some(index) = route(destination_id, registry.all_slots()) else {
        return DeliveryOutcome::NoRoute { destination_id };
    };
    let Some(slot) = registry.slot_mut(index) else {
        return DeliveryOutcome::NoRoute { destination_id };
    };
    let name = slot.name().to_owned();
    let Some(stream) = slot.connection_mut() else {
        return DeliveryOutcome::NoRoute { destination_id };
    };

    match forward(stream, unit, &name) {
        Ok(bytes) => DeliveryOutcome::Delivered {
            destination: index,
            bytes,
        },
        Err(error) => DeliveryOutcome::WriteFailed {
            destination: index,
            error,
        },
    }
}

/// Writes the whole unit, retrying short writes until every byte is out or a
/// write fails. Destinations are non-blocking, so a full socket buffer
/// surfaces as `WouldBlock` and fails the write instead of stalling the loop.
pub(crate) fn forward<W: Write>(
    writer: &mut W,
    unit: &[u8],
    destination: &str,
) -> Result<usize, WriteError> {
    let mut written = 0;
    while written < unit.len() {
        let remaining = unit.get(written..).unwrap_or_default();
        match writer.write(remaining) {
            Ok(0) => {
                return Err(WriteError {
                    destination: destination.to_owned(),
                    written,
                    expected: unit.len(),
                    source: io::Error::from(io::ErrorKind::WriteZero),
                });
            }
            Ok(count) => {
                written += count;
                trace!(
                    target: DISPATCH_TARGET,
                    destination,
                    written,
                    expected = unit.len(),
                    "unit bytes written"
                );
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => {
                return Err(WriteError {
                    destination: destination.to_owned(),
                    written,
                    expected: unit.len(),
                    source,
                });
            }
        }
    }
    Ok(written)
}
