//! Assignment operations: the only code that mutates a session's port
//! bindings.
//!
//! Every operation validates and resolves first, then commits. A call either
//! applies completely (assignments and resolved pins updated together) or
//! returns an error with the session untouched.

use std::fmt;

use tracing::debug;

use crate::catalog::BoardCatalog;
use crate::error::{ConfigError, ConfigResult};
use crate::models::{
    Assignment, AssignmentRecord, BoardRole, LogicalFunction, PinOptions, PortRef, ResolvedPins,
    Session, SessionDocument, SlotRole, SlotSelector,
};
use crate::pins::{self, ResolveContext};

/// What an `assign` call changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// Slot was empty and now holds the port
    Assigned,
    /// Slot moved from `previous` to the new port
    Reassigned {
        /// Port the slot held before
        previous: PortRef,
    },
    /// Slot already held this port; nothing changed
    Unchanged,
}

/// A document entry that could not be replayed during restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreIssue {
    /// What was being restored (e.g. "fan_hotend.port", "board.toolboard")
    pub entry: String,
    /// Why it was skipped
    pub error: ConfigError,
}

impl fmt::Display for RestoreIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.error)
    }
}

/// Mutation surface over a [`Session`], backed by a board catalog.
pub struct AssignmentService<'a, C: BoardCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: BoardCatalog + ?Sized> AssignmentService<'a, C> {
    /// Creates a service over `catalog`.
    pub const fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Selects (or with `None`, deselects) the board for a role.
    ///
    /// Changing the board clears every assignment under that role, since the
    /// old board's ports no longer exist. Returns the number of cleared slots.
    pub fn select_board(
        &self,
        session: &mut Session,
        role: BoardRole,
        board_id: Option<&str>,
    ) -> ConfigResult<usize> {
        if let Some(id) = board_id {
            let board = self.catalog.get_board(id)?;
            if board.role != role {
                debug!(board = id, %role, "using board outside its catalog role");
            }
        }

        if session.board(role) == board_id {
            return Ok(0);
        }

        let stale: Vec<_> = session
            .assignments()
            .filter(|a| a.port.role == role)
            .map(|a| (a.function, a.slot))
            .collect();
        for (function, slot) in &stale {
            session.remove_slot(*function, *slot);
        }
        session.set_board(role, board_id.map(str::to_string));

        debug!(%role, board = ?board_id, cleared = stale.len(), "selected board");
        Ok(stale.len())
    }

    /// Binds a port to a function slot.
    pub fn assign(
        &self,
        session: &mut Session,
        function: LogicalFunction,
        role: BoardRole,
        port_id: &str,
        slot: SlotRole,
    ) -> ConfigResult<AssignOutcome> {
        if slot == SlotRole::Secondary {
            if !function.supports_secondary() {
                return Err(ConfigError::SecondaryNotSupported { function });
            }
            if session.assignment(function, SlotRole::Primary).is_none() {
                return Err(ConfigError::SecondaryWithoutPrimary { function });
            }
        }

        let board_id = session
            .board(role)
            .ok_or(ConfigError::BoardNotSelected { role })?;
        let board = self.catalog.get_board(board_id)?;
        let port = board.port(port_id).ok_or_else(|| ConfigError::UnknownPort {
            role,
            board_id: board.id.clone(),
            port_id: port_id.to_string(),
        })?;

        if port.category != function.category() {
            return Err(ConfigError::CategoryMismatch {
                function,
                expected: function.category(),
                found: port.category,
                port_id: port.id.clone(),
            });
        }

        if let Some((owner, owner_slot)) = session.registry().owner_of(role, &port.id) {
            if owner == function && owner_slot == slot {
                return Ok(AssignOutcome::Unchanged);
            }
            return Err(ConfigError::PortAlreadyUsed {
                role,
                port_id: port.id.clone(),
                owner,
                slot: owner_slot,
            });
        }

        let context = ResolveContext::new(role).with_options(session.pin_options(function));
        let resolved = pins::resolve(port, function, context)?;

        // Everything validated; commit.
        let previous = session
            .assignment(function, slot)
            .map(|a| a.port.clone());
        let port_ref = PortRef::new(role, port.id.clone());
        session.insert_assignment(
            Assignment {
                function,
                slot,
                port: port_ref.clone(),
                category: port.category,
            },
            resolved,
        );
        if slot == SlotRole::Primary {
            session.set_location_raw(function, Some(role));
        }

        debug!(%function, %slot, port = %port_ref, "assigned port");
        Ok(match previous {
            Some(previous) => AssignOutcome::Reassigned { previous },
            None => AssignOutcome::Assigned,
        })
    }

    /// Clears slots of a function. Idempotent; returns how many slots were
    /// removed.
    ///
    /// Clearing the primary slot also clears the secondary, because a
    /// secondary cannot exist on its own.
    pub fn clear(&self, session: &mut Session, function: LogicalFunction, which: SlotSelector) -> usize {
        let slots: &[SlotRole] = match which {
            SlotSelector::Secondary => &[SlotRole::Secondary],
            SlotSelector::Primary | SlotSelector::Both => &[SlotRole::Primary, SlotRole::Secondary],
        };

        let removed = slots
            .iter()
            .filter(|slot| session.remove_slot(function, **slot))
            .count();
        if removed > 0 {
            debug!(%function, removed, "cleared function");
        }
        removed
    }

    /// Moves a function to another board role.
    ///
    /// When the role changes, all of the function's assignments are cleared
    /// before the new role is recorded, so no slot keeps a pin resolved under
    /// the old prefix. Returns the number of cleared slots.
    pub fn set_board_role(&self, session: &mut Session, function: LogicalFunction, role: BoardRole) -> usize {
        let primary_role = session
            .assignment(function, SlotRole::Primary)
            .map(|a| a.port.role);
        if session.location(function) == Some(role) && primary_role.is_none_or(|r| r == role) {
            return 0;
        }
        let cleared = self.clear(session, function, SlotSelector::Both);
        session.set_location_raw(function, Some(role));
        debug!(%function, %role, cleared, "changed function location");
        cleared
    }

    /// Clears whatever function owns a port.
    ///
    /// Returns the previous owner, or `None` when the port was free.
    pub fn clear_port(
        &self,
        session: &mut Session,
        role: BoardRole,
        port_id: &str,
    ) -> Option<(LogicalFunction, SlotRole)> {
        let (function, slot) = session.registry().owner_of(role, port_id)?;
        let which = match slot {
            SlotRole::Primary => SlotSelector::Primary,
            SlotRole::Secondary => SlotSelector::Secondary,
        };
        self.clear(session, function, which);
        Some((function, slot))
    }

    /// Updates a function's pin options and re-resolves its assigned slots.
    pub fn set_pin_options(
        &self,
        session: &mut Session,
        function: LogicalFunction,
        options: PinOptions,
    ) -> ConfigResult<()> {
        let mut refreshed: Vec<(SlotRole, ResolvedPins)> = Vec::new();
        for slot in [SlotRole::Primary, SlotRole::Secondary] {
            let Some(assignment) = session.assignment(function, slot) else {
                continue;
            };
            let role = assignment.port.role;
            let board_id = session
                .board(role)
                .ok_or(ConfigError::BoardNotSelected { role })?;
            let board = self.catalog.get_board(board_id)?;
            let port = board
                .port(&assignment.port.port_id)
                .ok_or_else(|| ConfigError::UnknownPort {
                    role,
                    board_id: board.id.clone(),
                    port_id: assignment.port.port_id.clone(),
                })?;
            let context = ResolveContext::new(role).with_options(options);
            refreshed.push((slot, pins::resolve(port, function, context)?));
        }

        session.set_pin_options_raw(function, options);
        for (slot, pins) in refreshed {
            session.replace_resolved((function, slot), pins);
        }
        debug!(%function, ?options, "updated pin options");
        Ok(())
    }

    /// Rebuilds a session from its document form by replaying every entry
    /// through the normal checks.
    ///
    /// Entries that no longer apply (unknown boards, ports that vanished from
    /// the catalog, conflicting claims) are skipped and reported.
    pub fn restore(&self, document: &SessionDocument) -> (Session, Vec<RestoreIssue>) {
        let mut session = Session::new();
        let mut issues = Vec::new();
        session.settings = document.settings.clone();

        for role in BoardRole::ALL {
            if let Some(id) = document.board(role) {
                if let Err(error) = self.select_board(&mut session, role, Some(id)) {
                    issues.push(RestoreIssue {
                        entry: format!("board.{role}"),
                        error,
                    });
                }
            }
        }

        for (function, options) in &document.pin_options {
            session.set_pin_options_raw(*function, *options);
        }

        // Primaries first so secondaries find their primary.
        let ordered = document
            .assignments
            .iter()
            .filter(|r| r.slot == SlotRole::Primary)
            .chain(document.assignments.iter().filter(|r| r.slot == SlotRole::Secondary));
        for record in ordered {
            if let Err(error) = self.replay(&mut session, record) {
                issues.push(RestoreIssue {
                    entry: record_entry(record),
                    error,
                });
            }
        }

        for (function, role) in &document.locations {
            let port_role = session
                .assignment(*function, SlotRole::Primary)
                .map(|a| a.port.role);
            match port_role {
                Some(port_role) if port_role != *role => issues.push(RestoreIssue {
                    entry: format!("{function}.location"),
                    error: ConfigError::LocationMismatch {
                        function: *function,
                        location: *role,
                        port_role,
                    },
                }),
                _ => session.set_location_raw(*function, Some(*role)),
            }
        }

        debug!(issues = issues.len(), "restored session");
        (session, issues)
    }

    fn replay(&self, session: &mut Session, record: &AssignmentRecord) -> ConfigResult<AssignOutcome> {
        self.assign(session, record.function, record.role, &record.port, record.slot)
    }
}

fn record_entry(record: &AssignmentRecord) -> String {
    match record.slot {
        SlotRole::Primary => format!("{}.port", record.function),
        SlotRole::Secondary => format!("{}.port_2", record.function),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{Axis, FanKind, HomingAxis, PinAttribute, PortCategory};

    const TEST_CATALOG: &str = r#"{"version": "1", "boards": [
        {
            "id": "main", "name": "Main", "manufacturer": "Test", "role": "mainboard",
            "ports": {
                "motor": [
                    {"id": "MOTOR0", "step": "PF13", "dir": "PF12", "enable": "PF14", "uart": "PC4"},
                    {"id": "MOTOR1", "step": "PG0", "dir": "PG1", "enable": "PF15"}
                ],
                "fan": [{"id": "FAN1", "pin": "PB0"}, {"id": "FAN2", "pin": "PB1"}],
                "endstop": [{"id": "STOP0", "pin": "PG6"}],
                "probe": [{"id": "PROBE", "signal": "PG15"}]
            }
        },
        {
            "id": "tool", "name": "Tool", "manufacturer": "Test", "role": "toolboard",
            "ports": {
                "fan": [{"id": "FAN1", "pin": "PA8"}],
                "endstop": [{"id": "IO1", "pin": "PB5"}]
            }
        }
    ]}"#;

    fn setup() -> (Catalog, Session) {
        let catalog = Catalog::from_json(TEST_CATALOG).unwrap();
        let mut session = Session::new();
        let service = AssignmentService::new(&catalog);
        service
            .select_board(&mut session, BoardRole::Mainboard, Some("main"))
            .unwrap();
        service
            .select_board(&mut session, BoardRole::Toolboard, Some("tool"))
            .unwrap();
        (catalog, session)
    }

    const X: LogicalFunction = LogicalFunction::Stepper(Axis::X);
    const Y: LogicalFunction = LogicalFunction::Stepper(Axis::Y);
    const HOTEND_FAN: LogicalFunction = LogicalFunction::Fan(FanKind::Hotend);

    #[test]
    fn test_assign_motor_resolves_pins() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);

        let outcome = service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap();
        assert_eq!(outcome, AssignOutcome::Assigned);

        let pins = session.resolved(X, SlotRole::Primary).unwrap();
        assert_eq!(pins.get(PinAttribute::Step), Some("PF13"));
        assert_eq!(pins.get(PinAttribute::Dir), Some("PF12"));
        assert_eq!(pins.get(PinAttribute::Enable), Some("!PF14"));
        assert_eq!(session.location(X), Some(BoardRole::Mainboard));
    }

    #[test]
    fn test_port_already_used_leaves_session_unchanged() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap();
        let before = session.clone();

        let err = service
            .assign(&mut session, Y, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PortAlreadyUsed { owner, .. } if owner == X
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn test_reclaiming_own_port_is_a_noop() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap();
        let outcome = service
            .assign(&mut session, X, BoardRole::Mainboard, "motor0", SlotRole::Primary)
            .unwrap();
        assert_eq!(outcome, AssignOutcome::Unchanged);
    }

    #[test]
    fn test_reassign_moves_slot() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap();
        let outcome = service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR1", SlotRole::Primary)
            .unwrap();
        assert_eq!(
            outcome,
            AssignOutcome::Reassigned {
                previous: PortRef::new(BoardRole::Mainboard, "MOTOR0")
            }
        );
        assert!(!session.registry().is_used(BoardRole::Mainboard, "MOTOR0"));
        assert!(session.registry().is_used(BoardRole::Mainboard, "MOTOR1"));
    }

    #[test]
    fn test_category_mismatch() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        let err = service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::CategoryMismatch {
                function: HOTEND_FAN,
                expected: PortCategory::Fan,
                found: PortCategory::Motor,
                port_id: "MOTOR0".to_string(),
            }
        );
        assert_eq!(session.assignments().count(), 0);
    }

    #[test]
    fn test_secondary_rules() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);

        let err = service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR1", SlotRole::Secondary)
            .unwrap_err();
        assert_eq!(err, ConfigError::SecondaryNotSupported { function: X });

        let err = service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN2", SlotRole::Secondary)
            .unwrap_err();
        assert_eq!(err, ConfigError::SecondaryWithoutPrimary { function: HOTEND_FAN });
    }

    #[test]
    fn test_multi_pin_fan_and_atomic_clear() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Primary)
            .unwrap();
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN2", SlotRole::Secondary)
            .unwrap();

        assert_eq!(
            session
                .resolved(HOTEND_FAN, SlotRole::Primary)
                .unwrap()
                .get(PinAttribute::Pin),
            Some("toolboard:PA8")
        );
        assert_eq!(
            session
                .resolved(HOTEND_FAN, SlotRole::Secondary)
                .unwrap()
                .get(PinAttribute::Pin),
            Some("PB1")
        );

        // Same fan cannot put its secondary on its own primary port.
        let err = service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Secondary)
            .unwrap_err();
        assert!(matches!(err, ConfigError::PortAlreadyUsed { .. }));

        assert_eq!(service.clear(&mut session, HOTEND_FAN, SlotSelector::Both), 2);
        assert!(session.assignment(HOTEND_FAN, SlotRole::Primary).is_none());
        assert!(session.assignment(HOTEND_FAN, SlotRole::Secondary).is_none());
        assert!(session.resolved(HOTEND_FAN, SlotRole::Secondary).is_none());

        // Idempotent.
        assert_eq!(service.clear(&mut session, HOTEND_FAN, SlotSelector::Both), 0);
    }

    #[test]
    fn test_clear_primary_drops_secondary() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN1", SlotRole::Primary)
            .unwrap();
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN2", SlotRole::Secondary)
            .unwrap();

        assert_eq!(service.clear(&mut session, HOTEND_FAN, SlotSelector::Secondary), 1);
        assert!(session.is_assigned(HOTEND_FAN));

        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN2", SlotRole::Secondary)
            .unwrap();
        assert_eq!(service.clear(&mut session, HOTEND_FAN, SlotSelector::Primary), 2);
    }

    #[test]
    fn test_clear_port_finds_owner() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Primary)
            .unwrap();
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN2", SlotRole::Secondary)
            .unwrap();

        let owner = service.clear_port(&mut session, BoardRole::Mainboard, "FAN2");
        assert_eq!(owner, Some((HOTEND_FAN, SlotRole::Secondary)));
        assert!(session.is_assigned(HOTEND_FAN));
        assert_eq!(service.clear_port(&mut session, BoardRole::Mainboard, "FAN2"), None);
    }

    #[test]
    fn test_set_board_role_clears_old_pins() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        let endstop = LogicalFunction::Endstop(HomingAxis::X);
        service
            .assign(&mut session, endstop, BoardRole::Mainboard, "STOP0", SlotRole::Primary)
            .unwrap();

        assert_eq!(service.set_board_role(&mut session, endstop, BoardRole::Mainboard), 0);
        assert!(session.is_assigned(endstop));

        assert_eq!(service.set_board_role(&mut session, endstop, BoardRole::Toolboard), 1);
        assert!(!session.is_assigned(endstop));
        assert!(session.resolved(endstop, SlotRole::Primary).is_none());
        assert_eq!(session.location(endstop), Some(BoardRole::Toolboard));

        service
            .assign(&mut session, endstop, BoardRole::Toolboard, "IO1", SlotRole::Primary)
            .unwrap();
        assert_eq!(
            session
                .resolved(endstop, SlotRole::Primary)
                .unwrap()
                .get(PinAttribute::Pin),
            Some("^toolboard:PB5")
        );
    }

    #[test]
    fn test_board_must_be_selected() {
        let catalog = Catalog::from_json(TEST_CATALOG).unwrap();
        let service = AssignmentService::new(&catalog);
        let mut session = Session::new();
        let err = service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap_err();
        assert_eq!(err, ConfigError::BoardNotSelected { role: BoardRole::Mainboard });

        let err = service
            .select_board(&mut session, BoardRole::Mainboard, Some("nope"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::CatalogMiss { .. }));
        assert_eq!(session.board(BoardRole::Mainboard), None);
    }

    #[test]
    fn test_changing_board_clears_role_assignments() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Primary)
            .unwrap();
        service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap();

        let cleared = service
            .select_board(&mut session, BoardRole::Toolboard, None)
            .unwrap();
        assert_eq!(cleared, 1);
        assert!(!session.is_assigned(HOTEND_FAN));
        assert!(session.is_assigned(X));
    }

    #[test]
    fn test_set_pin_options_re_resolves() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, LogicalFunction::Probe, BoardRole::Mainboard, "PROBE", SlotRole::Primary)
            .unwrap();
        assert_eq!(
            session
                .resolved(LogicalFunction::Probe, SlotRole::Primary)
                .unwrap()
                .get(PinAttribute::Signal),
            Some("^PG15")
        );

        service
            .set_pin_options(
                &mut session,
                LogicalFunction::Probe,
                PinOptions {
                    invert: true,
                    suppress_pullup: false,
                },
            )
            .unwrap();
        assert_eq!(
            session
                .resolved(LogicalFunction::Probe, SlotRole::Primary)
                .unwrap()
                .get(PinAttribute::Signal),
            Some("^!PG15")
        );
    }

    #[test]
    fn test_restore_round_trip_and_issues() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, X, BoardRole::Mainboard, "MOTOR0", SlotRole::Primary)
            .unwrap();
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Primary)
            .unwrap();
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Mainboard, "FAN2", SlotRole::Secondary)
            .unwrap();

        let mut document = session.to_document();
        let (restored, issues) = service.restore(&document);
        assert!(issues.is_empty());
        assert_eq!(restored, session);

        // A stale record is reported, the rest survives.
        document.assignments.push(AssignmentRecord {
            function: Y,
            slot: SlotRole::Primary,
            role: BoardRole::Mainboard,
            port: "MOTOR9".to_string(),
        });
        let (restored, issues) = service.restore(&document);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].entry, "stepper_y.port");
        assert!(restored.is_assigned(X));
        assert!(!restored.is_assigned(Y));
    }

    #[test]
    fn test_restore_rejects_location_off_the_primary_board() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Primary)
            .unwrap();

        let mut document = session.to_document();
        document.locations.insert(HOTEND_FAN, BoardRole::Mainboard);
        let (restored, issues) = service.restore(&document);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].entry, "fan_hotend.location");
        assert_eq!(
            issues[0].error,
            ConfigError::LocationMismatch {
                function: HOTEND_FAN,
                location: BoardRole::Mainboard,
                port_role: BoardRole::Toolboard,
            }
        );
        assert_eq!(restored.location(HOTEND_FAN), Some(BoardRole::Toolboard));
        assert!(restored.is_assigned(HOTEND_FAN));
    }

    #[test]
    fn test_set_board_role_clears_primary_on_other_board() {
        let (catalog, mut session) = setup();
        let service = AssignmentService::new(&catalog);
        service
            .assign(&mut session, HOTEND_FAN, BoardRole::Toolboard, "FAN1", SlotRole::Primary)
            .unwrap();
        // Location out of step with the port, as a hand-edited file could leave it.
        session.set_location_raw(HOTEND_FAN, Some(BoardRole::Mainboard));

        let cleared = service.set_board_role(&mut session, HOTEND_FAN, BoardRole::Mainboard);
        assert_eq!(cleared, 1);
        assert!(session.assignment(HOTEND_FAN, SlotRole::Primary).is_none());
        assert_eq!(session.location(HOTEND_FAN), Some(BoardRole::Mainboard));
    }
}
