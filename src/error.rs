//! Typed errors for the port registry, resolver, and renderer.
//!
//! Every variant is recoverable: an operation that returns one of these leaves
//! the session exactly as it was before the call.

use crate::models::{BoardRole, LogicalFunction, PinAttribute, PortCategory, SlotRole};
use thiserror::Error;

/// Result alias for core operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised by catalog lookups, assignment operations, pin resolution,
/// and strict rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No catalog entry exists for the board id.
    #[error("unknown board '{board_id}' (not in catalog)")]
    CatalogMiss {
        /// Board id that was looked up
        board_id: String,
    },

    /// The session has no board selected for this role.
    #[error("no {role} selected")]
    BoardNotSelected {
        /// Role without a board
        role: BoardRole,
    },

    /// The selected board has no port with this id.
    #[error("{role} '{board_id}' has no port '{port_id}'")]
    UnknownPort {
        /// Board role searched
        role: BoardRole,
        /// Board id searched
        board_id: String,
        /// Requested port id
        port_id: String,
    },

    /// Another function already owns the port.
    #[error("port {role}:{port_id} is already used by {owner} ({slot})")]
    PortAlreadyUsed {
        /// Board role of the port
        role: BoardRole,
        /// Port id
        port_id: String,
        /// Function currently owning the port
        owner: LogicalFunction,
        /// Slot the owner uses the port for
        slot: SlotRole,
    },

    /// The port's category cannot satisfy the function.
    #[error("{function} needs a {expected} port, but {port_id} is a {found} port")]
    CategoryMismatch {
        /// Function being assigned
        function: LogicalFunction,
        /// Category the function requires
        expected: PortCategory,
        /// Category of the requested port
        found: PortCategory,
        /// Requested port id
        port_id: String,
    },

    /// Secondary slot requested for a single-pin function.
    #[error("{function} does not support a secondary port")]
    SecondaryNotSupported {
        /// Function being assigned
        function: LogicalFunction,
    },

    /// Secondary slot requested before the primary one was assigned.
    #[error("{function} has no primary port; assign it before adding a secondary")]
    SecondaryWithoutPrimary {
        /// Function being assigned
        function: LogicalFunction,
    },

    /// The port does not wire the requested pin attribute.
    #[error("port {port_id} has no {attribute} pin")]
    AttributeUnavailable {
        /// Port id
        port_id: String,
        /// Missing attribute
        attribute: PinAttribute,
    },

    /// A function's recorded location disagrees with its primary port.
    #[error("{function} is placed on the {location}, but its port is on the {port_role}")]
    LocationMismatch {
        /// Function being placed
        function: LogicalFunction,
        /// Recorded location
        location: BoardRole,
        /// Role of the primary port
        port_role: BoardRole,
    },

    /// Strict rendering found required fields unset.
    #[error("missing required fields: {}", fields.join(", "))]
    MissingRequiredField {
        /// Names of the missing fields, in a stable order
        fields: Vec<String>,
    },
}

impl ConfigError {
    /// Short machine-readable kind name, used by the JSON front ends.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CatalogMiss { .. } => "catalog_miss",
            Self::BoardNotSelected { .. } => "board_not_selected",
            Self::UnknownPort { .. } => "unknown_port",
            Self::PortAlreadyUsed { .. } => "port_already_used",
            Self::CategoryMismatch { .. } => "category_mismatch",
            Self::SecondaryNotSupported { .. } => "secondary_not_supported",
            Self::SecondaryWithoutPrimary { .. } => "secondary_without_primary",
            Self::AttributeUnavailable { .. } => "attribute_unavailable",
            Self::LocationMismatch { .. } => "location_mismatch",
            Self::MissingRequiredField { .. } => "missing_required_field",
        }
    }
}
