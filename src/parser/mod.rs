//! Parsing and serialization for session files.
//!
//! This module reads and writes the flat `key=value` session format used by
//! the CLI to carry a configuration run between invocations.

pub mod session_file;

// Re-export commonly used functions
pub use session_file::{load_session, parse_session, save_session, serialize_session};
