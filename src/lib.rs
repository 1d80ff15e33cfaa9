//! Klipper Configurator Library
//!
//! Hardware port registry and pin resolution for Klipper printer configs:
//! a catalog of controller boards, a session that tracks which printer
//! function owns which port, a resolver that turns ports into Klipper pin
//! strings, and a renderer that emits `printer.cfg` / `toolboard.cfg`.

// Module declarations
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod firmware;
pub mod models;
pub mod parser;
pub mod pins;
pub mod registry;
pub mod services;
#[cfg(feature = "web")]
pub mod web;

pub use catalog::{BoardCatalog, Catalog};
pub use error::{ConfigError, ConfigResult};
pub use firmware::{render, RenderMode, RenderedConfig};
pub use models::Session;
pub use services::AssignmentService;
