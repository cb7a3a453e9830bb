//! Fixed table of component slots.
//!
//! Slots are created once at startup, in the order the caller supplies, and
//! that order is used for both polling and routing. A slot is addressed by its
//! index in the table, never by the numeric value of a socket descriptor, so
//! the table does not grow however often components reconnect.

mod component;
mod errors;
mod slot;

use courier_config::SocketLayout;
use tracing::info;

pub use self::component::{ComponentKind, ComponentSpec, DEFAULT_COMPONENTS, UnknownComponent};
pub use self::errors::{AcceptError, ReadError, RegistryError};
pub(crate) use self::slot::AcceptOutcome;
pub use self::slot::{Slot, SlotState};

use crate::transport::EndpointListener;

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Ordered slot table owned by the dispatcher.
#[derive(Debug)]
pub struct Registry {
    layout: SocketLayout,
    slots: Vec<Slot>,
}

impl Registry {
    /// Creates an empty registry whose endpoints follow `layout`.
    #[must_use]
    pub fn new(layout: SocketLayout) -> Self {
        Self {
            layout,
            slots: Vec::new(),
        }
    }

    /// Creates a registry holding one slot per component, in order.
    pub fn with_components(
        layout: SocketLayout,
        components: &[ComponentSpec],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(layout);
        for spec in components {
            registry.create_slot(spec.name, spec.kind)?;
        }
        Ok(registry)
    }

    /// Binds the endpoint for a new slot and appends it to the table.
    pub fn create_slot(
        &mut self,
        name: impl Into<String>,
        kind: ComponentKind,
    ) -> Result<&Slot, RegistryError> {
        let name = name.into();
        if let Some(existing) = self.slots.iter().find(|slot| slot.kind() == kind) {
            return Err(RegistryError::DuplicateComponent {
                kind,
                existing: existing.name().to_owned(),
            });
        }

        let path = self.layout.endpoint_path(&name);
        let listener =
            EndpointListener::bind(&path).map_err(|source| RegistryError::Endpoint {
                name: name.clone(),
                source,
            })?;
        info!(
            target: REGISTRY_TARGET,
            component = %kind,
            id = kind.id(),
            name = %name,
            endpoint = %path,
            "slot created"
        );
        let index = self.slots.len();
        self.slots.push(Slot::new(kind, name, listener));
        Ok(&self.slots[index])
    }

    /// Every slot, in registry order.
    #[must_use]
    pub fn all_slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot at `index` in registry order.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Number of slots; fixed once bootstrap completes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the slot serving `kind`, connected or not.
    #[must_use]
    pub fn index_of(&self, kind: ComponentKind) -> Option<usize> {
        self.slots.iter().position(|slot| slot.kind() == kind)
    }

    /// Number of slots currently holding a peer.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_connected()).count()
    }

    /// Closes every connection and endpoint. Returns the number of slots and
    /// of live connections released.
    pub(crate) fn teardown(self) -> (usize, usize) {
        let mut slots = self.slots;
        let released_connections = slots
            .iter_mut()
            .map(Slot::release_connection)
            .filter(|released| *released)
            .count();
        let released_slots = slots.len();
        drop(slots);
        (released_slots, released_connections)
    }
}
