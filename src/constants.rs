//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and version information.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "Klipper Configurator";

/// The binary name of the application (used in command examples, lowercase with hyphens).
pub const APP_BINARY_NAME: &str = "klipconf";

/// Session file used when `--session` is not given.
pub const DEFAULT_SESSION_FILE: &str = "klipconf.session";
