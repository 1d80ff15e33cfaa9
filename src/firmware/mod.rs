//! Klipper config generation.
//!
//! This module validates a session and renders it into `printer.cfg` and,
//! when a toolboard is selected, `toolboard.cfg`.

pub mod renderer;
pub mod validator;

// Re-export firmware types
pub use renderer::{render, RenderMode, RenderedConfig, PRINTER_CFG, TOOLBOARD_CFG};
pub use validator::{SessionValidator, ValidationReport};
