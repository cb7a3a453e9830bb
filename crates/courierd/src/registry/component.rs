//! Component identities carried in the destination byte of every unit.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// Every addressable participant on the flight-software bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[repr(u8)]
pub enum ComponentKind {
    Obc = 0,
    Eps = 1,
    Adcs = 2,
    Dfgm = 3,
    Iris = 4,
    Gps = 5,
    Deployables = 6,
    Gs = 7,
    Coms = 8,
    BulkMsgDispatcher = 9,
    Shell = 10,
    Uhf = 11,
    Test = 12,
}

impl ComponentKind {
    /// Identifier written into the destination byte of a unit.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

/// Raised when a destination byte names no known component.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown component id {0}")]
pub struct UnknownComponent(pub u8);

impl TryFrom<u8> for ComponentKind {
    type Error = UnknownComponent;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::iter()
            .find(|kind| kind.id() == value)
            .ok_or(UnknownComponent(value))
    }
}

/// Name and identity of a slot the dispatcher serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Endpoint name, appended to the configured socket prefix.
    pub name: &'static str,
    /// Identity matched against destination bytes.
    pub kind: ComponentKind,
}

impl ComponentSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: ComponentKind) -> Self {
        Self { name, kind }
    }
}

/// Slots served by the flight dispatcher, in polling and routing order.
pub const DEFAULT_COMPONENTS: &[ComponentSpec] = &[
    ComponentSpec::new("adcs_handler", ComponentKind::Adcs),
    ComponentSpec::new("dfgm_handler", ComponentKind::Dfgm),
    ComponentSpec::new("coms_handler", ComponentKind::Coms),
    ComponentSpec::new("eps_handler", ComponentKind::Eps),
    ComponentSpec::new("gps_handler", ComponentKind::Gps),
    ComponentSpec::new("iris_handler", ComponentKind::Iris),
    ComponentSpec::new("bulk_disp", ComponentKind::BulkMsgDispatcher),
    ComponentSpec::new("shell_handler", ComponentKind::Shell),
    ComponentSpec::new("test_handler", ComponentKind::Test),
];
