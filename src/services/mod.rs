//! Service layer for business logic.
//!
//! Services own the rules that span several models. The assignment service
//! is the only way to change which function owns which port.

pub mod assignments;

pub use assignments::{AssignOutcome, AssignmentService, RestoreIssue};
