//! The configuration session aggregate.
//!
//! A `Session` owns every assignment, the resolved-pin cache, per-function pin
//! options, and the scalar settings of one configuration run. Its assignment
//! state can only be changed through
//! [`AssignmentService`](crate::services::AssignmentService), which keeps the
//! cache and the assignment map in lockstep.

use crate::models::{
    BoardRole, LogicalFunction, PinAttribute, PinOptions, PortCategory, PortRef, Settings,
    SlotRole,
};
use crate::registry::PortRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of one function slot.
pub type SlotKey = (LogicalFunction, SlotRole);

/// Binding of one port to one function slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Owning function
    pub function: LogicalFunction,
    /// Slot within the function
    pub slot: SlotRole,
    /// Port address
    pub port: PortRef,
    /// Category of the port at assignment time
    pub category: PortCategory,
}

/// Literal pin strings derived for one assigned slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPins {
    pins: BTreeMap<PinAttribute, String>,
}

impl ResolvedPins {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pins: BTreeMap::new(),
        }
    }

    /// Records the resolved string for an attribute.
    pub fn insert(&mut self, attribute: PinAttribute, value: String) {
        self.pins.insert(attribute, value);
    }

    /// Resolved string for an attribute, if the port wires it.
    #[must_use]
    pub fn get(&self, attribute: PinAttribute) -> Option<&str> {
        self.pins.get(&attribute).map(String::as_str)
    }

    /// All resolved attributes in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (PinAttribute, &str)> {
        self.pins.iter().map(|(attr, pin)| (*attr, pin.as_str()))
    }

    /// Number of resolved attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// One configuration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    boards: BTreeMap<BoardRole, String>,
    assignments: BTreeMap<SlotKey, Assignment>,
    resolved: BTreeMap<SlotKey, ResolvedPins>,
    pin_options: BTreeMap<LogicalFunction, PinOptions>,
    locations: BTreeMap<LogicalFunction, BoardRole>,
    /// Scalar settings; free to edit directly
    pub settings: Settings,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Board id selected for a role.
    #[must_use]
    pub fn board(&self, role: BoardRole) -> Option<&str> {
        self.boards.get(&role).map(String::as_str)
    }

    /// Assignment of a function slot.
    #[must_use]
    pub fn assignment(&self, function: LogicalFunction, slot: SlotRole) -> Option<&Assignment> {
        self.assignments.get(&(function, slot))
    }

    /// All assignments in `(function, slot)` order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// Whether a function has any port assigned.
    #[must_use]
    pub fn is_assigned(&self, function: LogicalFunction) -> bool {
        self.assignments.contains_key(&(function, SlotRole::Primary))
    }

    /// Cached resolved pins of a slot.
    #[must_use]
    pub fn resolved(&self, function: LogicalFunction, slot: SlotRole) -> Option<&ResolvedPins> {
        self.resolved.get(&(function, slot))
    }

    /// User pin options of a function (defaults when never set).
    #[must_use]
    pub fn pin_options(&self, function: LogicalFunction) -> PinOptions {
        self.pin_options.get(&function).copied().unwrap_or_default()
    }

    /// Home location of a function, if one was chosen.
    #[must_use]
    pub fn location(&self, function: LogicalFunction) -> Option<BoardRole> {
        self.locations.get(&function).copied()
    }

    /// Registry view over the current assignments.
    #[must_use]
    pub fn registry(&self) -> PortRegistry<'_> {
        PortRegistry::build(self.assignments.values())
    }

    /// Converts the session to its persistable document form.
    #[must_use]
    pub fn to_document(&self) -> SessionDocument {
        SessionDocument {
            mainboard: self.board(BoardRole::Mainboard).map(str::to_string),
            toolboard: self.board(BoardRole::Toolboard).map(str::to_string),
            assignments: self
                .assignments
                .values()
                .map(|a| AssignmentRecord {
                    function: a.function,
                    slot: a.slot,
                    role: a.port.role,
                    port: a.port.port_id.clone(),
                })
                .collect(),
            pin_options: self
                .pin_options
                .iter()
                .filter(|(_, options)| !options.is_default())
                .map(|(function, options)| (*function, *options))
                .collect(),
            locations: self.locations.clone(),
            settings: self.settings.clone(),
        }
    }

    pub(crate) fn set_board(&mut self, role: BoardRole, board_id: Option<String>) {
        match board_id {
            Some(id) => {
                self.boards.insert(role, id);
            }
            None => {
                self.boards.remove(&role);
            }
        }
    }

    pub(crate) fn insert_assignment(&mut self, assignment: Assignment, pins: ResolvedPins) {
        let key = (assignment.function, assignment.slot);
        self.assignments.insert(key, assignment);
        self.resolved.insert(key, pins);
    }

    pub(crate) fn remove_slot(&mut self, function: LogicalFunction, slot: SlotRole) -> bool {
        self.resolved.remove(&(function, slot));
        self.assignments.remove(&(function, slot)).is_some()
    }

    pub(crate) fn replace_resolved(&mut self, key: SlotKey, pins: ResolvedPins) {
        self.resolved.insert(key, pins);
    }

    pub(crate) fn set_pin_options_raw(&mut self, function: LogicalFunction, options: PinOptions) {
        if options.is_default() {
            self.pin_options.remove(&function);
        } else {
            self.pin_options.insert(function, options);
        }
    }

    pub(crate) fn set_location_raw(&mut self, function: LogicalFunction, role: Option<BoardRole>) {
        match role {
            Some(role) => {
                self.locations.insert(function, role);
            }
            None => {
                self.locations.remove(&function);
            }
        }
    }
}

/// One persisted assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Function key
    pub function: LogicalFunction,
    /// Slot (defaults to primary)
    #[serde(default = "default_slot")]
    pub slot: SlotRole,
    /// Board role of the port
    pub role: BoardRole,
    /// Port id
    pub port: String,
}

const fn default_slot() -> SlotRole {
    SlotRole::Primary
}

/// Transport and persistence form of a session: plain facts, no derived pins.
///
/// Turned back into a [`Session`] by
/// [`AssignmentService::restore`](crate::services::AssignmentService::restore),
/// which replays each record through the normal assignment checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Selected mainboard id
    #[serde(default)]
    pub mainboard: Option<String>,
    /// Selected toolboard id
    #[serde(default)]
    pub toolboard: Option<String>,
    /// Assignments
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
    /// Non-default pin options
    #[serde(default)]
    pub pin_options: BTreeMap<LogicalFunction, PinOptions>,
    /// Chosen function locations
    #[serde(default)]
    pub locations: BTreeMap<LogicalFunction, BoardRole>,
    /// Scalar settings
    #[serde(default)]
    pub settings: Settings,
}

impl SessionDocument {
    /// Board id for a role.
    #[must_use]
    pub fn board(&self, role: BoardRole) -> Option<&str> {
        match role {
            BoardRole::Mainboard => self.mainboard.as_deref(),
            BoardRole::Toolboard => self.toolboard.as_deref(),
        }
    }
}
