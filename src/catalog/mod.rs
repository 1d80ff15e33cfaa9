//! Board capability catalog.
//!
//! Board definitions are embedded in the binary at compile time
//! (`boards.json`) and can be extended with a user catalog file of the same
//! shape. The catalog is read-only once loaded.

use crate::error::{ConfigError, ConfigResult};
use crate::models::{Board, BoardRole, MotorPins, PinSet, Port, PortCategory};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Lookup contract the assignment service and front ends depend on.
pub trait BoardCatalog {
    /// Returns the board with this id, or `CatalogMiss`.
    fn get_board(&self, board_id: &str) -> ConfigResult<&Board>;

    /// All boards, ordered by id.
    fn boards(&self) -> Vec<&Board>;
}

/// Catalog file schema.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[allow(dead_code)]
    version: String,
    boards: Vec<RawBoard>,
}

#[derive(Debug, Deserialize)]
struct RawBoard {
    id: String,
    name: String,
    manufacturer: String,
    role: BoardRole,
    #[serde(default)]
    mcu: String,
    #[serde(default)]
    ports: RawPorts,
}

#[derive(Debug, Default, Deserialize)]
struct RawPorts {
    #[serde(default)]
    motor: Vec<RawMotorPort>,
    #[serde(default)]
    heater: Vec<RawSimplePort>,
    #[serde(default)]
    thermistor: Vec<RawSimplePort>,
    #[serde(default)]
    fan: Vec<RawSimplePort>,
    #[serde(default)]
    endstop: Vec<RawSimplePort>,
    #[serde(default)]
    probe: Vec<RawProbePort>,
    #[serde(default)]
    misc: Vec<RawSimplePort>,
}

#[derive(Debug, Deserialize)]
struct RawMotorPort {
    id: String,
    #[serde(default)]
    label: Option<String>,
    step: String,
    dir: String,
    enable: String,
    #[serde(default)]
    uart: Option<String>,
    #[serde(default)]
    cs: Option<String>,
    #[serde(default)]
    diag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSimplePort {
    id: String,
    #[serde(default)]
    label: Option<String>,
    pin: String,
}

#[derive(Debug, Deserialize)]
struct RawProbePort {
    id: String,
    #[serde(default)]
    label: Option<String>,
    signal: String,
    #[serde(default)]
    servo: Option<String>,
}

impl RawBoard {
    fn into_board(self, pin_regex: &Regex) -> Result<Board> {
        if self.id.trim().is_empty() {
            anyhow::bail!("Board id cannot be empty");
        }

        let board_id = self.id.clone();
        let check_pin = |port: &str, pin: &str| -> Result<String> {
            if !pin_regex.is_match(pin) {
                anyhow::bail!(
                    "Board '{board_id}' port '{port}': invalid raw pin '{pin}' \
                     (modifiers and MCU prefixes are added during resolution)"
                );
            }
            Ok(pin.to_string())
        };
        let check_opt = |port: &str, pin: Option<String>| -> Result<Option<String>> {
            pin.map(|p| check_pin(port, &p)).transpose()
        };

        let mut ports = Vec::new();
        for raw in self.ports.motor {
            let pins = MotorPins {
                step: check_pin(&raw.id, &raw.step)?,
                dir: check_pin(&raw.id, &raw.dir)?,
                enable: check_pin(&raw.id, &raw.enable)?,
                uart: check_opt(&raw.id, raw.uart)?,
                cs: check_opt(&raw.id, raw.cs)?,
                diag: check_opt(&raw.id, raw.diag)?,
            };
            ports.push(Port {
                id: raw.id,
                label: raw.label,
                category: PortCategory::Motor,
                pins: PinSet::Motor(pins),
            });
        }

        let simple = [
            (PortCategory::Heater, self.ports.heater),
            (PortCategory::Thermistor, self.ports.thermistor),
            (PortCategory::Fan, self.ports.fan),
            (PortCategory::Endstop, self.ports.endstop),
        ];
        for (category, raws) in simple {
            for raw in raws {
                let pin = check_pin(&raw.id, &raw.pin)?;
                ports.push(Port {
                    id: raw.id,
                    label: raw.label,
                    category,
                    pins: PinSet::Simple { pin },
                });
            }
        }

        for raw in self.ports.probe {
            let signal = check_pin(&raw.id, &raw.signal)?;
            let servo = check_opt(&raw.id, raw.servo)?;
            ports.push(Port {
                id: raw.id,
                label: raw.label,
                category: PortCategory::Probe,
                pins: PinSet::Probe { signal, servo },
            });
        }

        for raw in self.ports.misc {
            let pin = check_pin(&raw.id, &raw.pin)?;
            ports.push(Port {
                id: raw.id,
                label: raw.label,
                category: PortCategory::Misc,
                pins: PinSet::Simple { pin },
            });
        }

        // Port ids address a port within a board role, so they must be unique
        // across categories, not just within one.
        let mut seen = HashSet::new();
        for port in &ports {
            if port.id.trim().is_empty() {
                anyhow::bail!("Board '{}' has a port with an empty id", self.id);
            }
            if !seen.insert(port.id.to_ascii_uppercase()) {
                anyhow::bail!("Board '{}' defines port '{}' more than once", self.id, port.id);
            }
        }

        Ok(Board {
            id: self.id,
            name: self.name,
            manufacturer: self.manufacturer,
            role: self.role,
            mcu: self.mcu,
            ports,
        })
    }
}

/// In-memory board catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    boards: BTreeMap<String, Board>,
}

impl Catalog {
    /// Loads the catalog embedded in the binary.
    pub fn load() -> Result<Self> {
        let json_data = include_str!("boards.json");
        Self::from_json(json_data).context("Failed to parse embedded boards.json")
    }

    /// Parses a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut catalog = Self::default();
        catalog.merge_json(json)?;
        Ok(catalog)
    }

    /// Merges boards from JSON text. Board ids must not collide.
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let file: CatalogFile = serde_json::from_str(json).context("Invalid catalog JSON")?;
        let pin_regex = Regex::new(r"^[A-Za-z0-9_.]+$").context("Invalid pin pattern")?;

        // Validate everything before touching self so a bad file merges nothing.
        let mut incoming = Vec::with_capacity(file.boards.len());
        let mut ids = HashSet::new();
        for raw in file.boards {
            let board = raw.into_board(&pin_regex)?;
            if self.boards.contains_key(&board.id) || !ids.insert(board.id.clone()) {
                anyhow::bail!("Duplicate board id '{}' in catalog", board.id);
            }
            incoming.push(board);
        }

        for board in incoming {
            self.boards.insert(board.id.clone(), board);
        }
        Ok(())
    }

    /// Merges boards from a user catalog file.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        self.merge_json(&content)
            .with_context(|| format!("Failed to load catalog file: {}", path.display()))
    }

    /// Embedded catalog plus an optional user file.
    pub fn load_with(extra: Option<&Path>) -> Result<Self> {
        let mut catalog = Self::load()?;
        if let Some(path) = extra {
            catalog.merge_file(path)?;
        }
        Ok(catalog)
    }

    /// Boards designed for a role.
    #[must_use]
    pub fn boards_for_role(&self, role: BoardRole) -> Vec<&Board> {
        self.boards.values().filter(|b| b.role == role).collect()
    }

    /// Number of boards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

impl BoardCatalog for Catalog {
    fn get_board(&self, board_id: &str) -> ConfigResult<&Board> {
        self.boards
            .get(board_id)
            .ok_or_else(|| ConfigError::CatalogMiss {
                board_id: board_id.to_string(),
            })
    }

    fn boards(&self) -> Vec<&Board> {
        self.boards.values().collect()
    }
}
