//! Data models for boards, logical functions, assignments, and sessions.
//!
//! Models are independent of the front ends; all invariant checks live in
//! the assignment service.

pub mod board;
pub mod function;
pub mod session;
pub mod settings;

pub use board::{Board, BoardRole, MotorPins, PinAttribute, PinSet, Port, PortCategory, PortRef};
pub use function::{Axis, FanKind, HomingAxis, LogicalFunction, PinOptions, SlotRole, SlotSelector};
pub use session::{Assignment, AssignmentRecord, ResolvedPins, Session, SessionDocument, SlotKey};
pub use settings::{
    DriverInterface, DriverType, Kinematics, ProbeKind, Settings, ZEndstopSource, SETTING_KEYS,
};
