//! Port registry: who owns which port.
//!
//! The registry is a read view built from a session's assignments. It holds no
//! business rules; [`AssignmentService`](crate::services::AssignmentService)
//! consults it before committing a change. Because it is rebuilt from the
//! session on every [`Session::registry`](crate::models::Session::registry)
//! call, it always reflects the latest write.

use crate::models::{Assignment, BoardRole, LogicalFunction, PortCategory, PortRef, SlotRole};
use std::collections::{BTreeSet, HashMap};

/// Index over assignments keyed by port.
#[derive(Debug, Clone, Default)]
pub struct PortRegistry<'a> {
    by_port: HashMap<(BoardRole, String), &'a Assignment>,
    ordered: Vec<&'a Assignment>,
}

impl<'a> PortRegistry<'a> {
    /// Builds the index from assignments.
    pub fn build(assignments: impl IntoIterator<Item = &'a Assignment>) -> Self {
        let mut registry = Self::default();
        for assignment in assignments {
            registry.by_port.insert(
                (assignment.port.role, port_key(&assignment.port.port_id)),
                assignment,
            );
            registry.ordered.push(assignment);
        }
        registry
    }

    /// Whether any function owns the port.
    #[must_use]
    pub fn is_used(&self, role: BoardRole, port_id: &str) -> bool {
        self.by_port.contains_key(&(role, port_key(port_id)))
    }

    /// Function and slot owning the port.
    #[must_use]
    pub fn owner_of(&self, role: BoardRole, port_id: &str) -> Option<(LogicalFunction, SlotRole)> {
        self.by_port
            .get(&(role, port_key(port_id)))
            .map(|a| (a.function, a.slot))
    }

    /// Ports of a category that are already claimed, for graying out pickers.
    #[must_use]
    pub fn used_by_category(&self, category: PortCategory) -> BTreeSet<PortRef> {
        self.ordered
            .iter()
            .filter(|a| a.category == category)
            .map(|a| a.port.clone())
            .collect()
    }

    /// Every assignment, in `(function, slot)` order.
    #[must_use]
    pub fn all_assignments(&self) -> Vec<Assignment> {
        self.ordered.iter().map(|a| (*a).clone()).collect()
    }

    /// Ports claimed by more than one slot. Always empty for sessions built
    /// through the assignment service.
    #[must_use]
    pub fn conflicts(&self) -> Vec<PortRef> {
        let mut seen = BTreeSet::new();
        let mut conflicts = BTreeSet::new();
        for assignment in &self.ordered {
            let key = (assignment.port.role, port_key(&assignment.port.port_id));
            if !seen.insert(key) {
                conflicts.insert(assignment.port.clone());
            }
        }
        conflicts.into_iter().collect()
    }
}

/// Port ids compare case-insensitively.
fn port_key(port_id: &str) -> String {
    port_id.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Axis, FanKind};

    fn assignment(function: LogicalFunction, slot: SlotRole, port: PortRef) -> Assignment {
        Assignment {
            category: function.category(),
            function,
            slot,
            port,
        }
    }

    #[test]
    fn test_lookup() {
        let assignments = vec![
            assignment(
                LogicalFunction::Stepper(Axis::X),
                SlotRole::Primary,
                PortRef::new(BoardRole::Mainboard, "MOTOR0"),
            ),
            assignment(
                LogicalFunction::Fan(FanKind::Hotend),
                SlotRole::Primary,
                PortRef::new(BoardRole::Toolboard, "FAN1"),
            ),
            assignment(
                LogicalFunction::Fan(FanKind::Hotend),
                SlotRole::Secondary,
                PortRef::new(BoardRole::Mainboard, "FAN2"),
            ),
        ];
        let registry = PortRegistry::build(&assignments);

        assert!(registry.is_used(BoardRole::Mainboard, "MOTOR0"));
        assert!(registry.is_used(BoardRole::Mainboard, "motor0"));
        assert!(!registry.is_used(BoardRole::Toolboard, "MOTOR0"));
        assert_eq!(
            registry.owner_of(BoardRole::Mainboard, "FAN2"),
            Some((LogicalFunction::Fan(FanKind::Hotend), SlotRole::Secondary))
        );
        assert_eq!(registry.owner_of(BoardRole::Mainboard, "FAN1"), None);

        let fans = registry.used_by_category(PortCategory::Fan);
        assert_eq!(fans.len(), 2);
        assert!(fans.contains(&PortRef::new(BoardRole::Toolboard, "FAN1")));
        assert_eq!(registry.all_assignments().len(), 3);
        assert!(registry.conflicts().is_empty());
    }

    #[test]
    fn test_conflicts_detected() {
        let assignments = vec![
            assignment(
                LogicalFunction::Fan(FanKind::Exhaust),
                SlotRole::Primary,
                PortRef::new(BoardRole::Mainboard, "FAN3"),
            ),
            assignment(
                LogicalFunction::Fan(FanKind::Chamber),
                SlotRole::Primary,
                PortRef::new(BoardRole::Mainboard, "fan3"),
            ),
        ];
        let registry = PortRegistry::build(&assignments);
        assert_eq!(registry.conflicts().len(), 1);
    }
}
