//! Board, port, and pin-set types.
//!
//! Boards are loaded once from the catalog and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a board sits in the printer, which also decides the pin prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    /// Main controller; pins carry no prefix
    Mainboard,
    /// Toolhead board on its own MCU; pins carry `toolboard:`
    Toolboard,
}

impl BoardRole {
    /// All roles in a stable order.
    pub const ALL: [Self; 2] = [Self::Mainboard, Self::Toolboard];

    /// Identifier used in session files and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainboard => "mainboard",
            Self::Toolboard => "toolboard",
        }
    }

    /// MCU name this role's pins are prefixed with, if any.
    #[must_use]
    pub const fn mcu_prefix(self) -> Option<&'static str> {
        match self {
            Self::Mainboard => None,
            Self::Toolboard => Some("toolboard"),
        }
    }
}

impl fmt::Display for BoardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainboard" | "main" | "mcu" => Ok(Self::Mainboard),
            "toolboard" | "tool" | "toolhead" => Ok(Self::Toolboard),
            other => anyhow::bail!("Unknown board role '{other}'. Expected 'mainboard' or 'toolboard'"),
        }
    }
}

/// Port category on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortCategory {
    /// Stepper driver socket
    Motor,
    /// Heater MOSFET output
    Heater,
    /// Thermistor ADC input
    Thermistor,
    /// Fan output
    Fan,
    /// Endstop input
    Endstop,
    /// Probe connector (signal plus optional servo)
    Probe,
    /// Anything else (PS_ON, lights, spare GPIO)
    Misc,
}

impl PortCategory {
    /// All categories in display order.
    pub const ALL: [Self; 7] = [
        Self::Motor,
        Self::Heater,
        Self::Thermistor,
        Self::Fan,
        Self::Endstop,
        Self::Probe,
        Self::Misc,
    ];

    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motor => "motor",
            Self::Heater => "heater",
            Self::Thermistor => "thermistor",
            Self::Fan => "fan",
            Self::Endstop => "endstop",
            Self::Probe => "probe",
            Self::Misc => "misc",
        }
    }
}

impl fmt::Display for PortCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown port category '{s}'"))
    }
}

/// Named pin within a port's pin set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinAttribute {
    /// Motor step line
    Step,
    /// Motor direction line
    Dir,
    /// Motor enable line
    Enable,
    /// Driver UART line
    Uart,
    /// Driver SPI chip select
    Cs,
    /// Driver DIAG output (sensorless homing)
    Diag,
    /// Single pin of a simple port
    Pin,
    /// Probe signal input
    Signal,
    /// Probe servo control output
    Servo,
}

impl PinAttribute {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Dir => "dir",
            Self::Enable => "enable",
            Self::Uart => "uart",
            Self::Cs => "cs",
            Self::Diag => "diag",
            Self::Pin => "pin",
            Self::Signal => "signal",
            Self::Servo => "servo",
        }
    }
}

impl fmt::Display for PinAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pins of a stepper driver socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorPins {
    /// Step pin
    pub step: String,
    /// Direction pin
    pub dir: String,
    /// Enable pin
    pub enable: String,
    /// UART pin (TMC UART drivers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uart: Option<String>,
    /// SPI chip-select pin (TMC SPI drivers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cs: Option<String>,
    /// DIAG pin routed to the MCU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diag: Option<String>,
}

/// Category-specific raw pins of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PinSet {
    /// Stepper socket
    Motor(MotorPins),
    /// Heater, thermistor, fan, endstop or misc port
    Simple {
        /// The single pin
        pin: String,
    },
    /// Probe connector
    Probe {
        /// Signal input
        signal: String,
        /// Servo output (BLTouch style probes)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        servo: Option<String>,
    },
}

impl PinSet {
    /// Returns the raw pin wired for `attribute`, if the port has one.
    #[must_use]
    pub fn raw(&self, attribute: PinAttribute) -> Option<&str> {
        match (self, attribute) {
            (Self::Motor(m), PinAttribute::Step) => Some(&m.step),
            (Self::Motor(m), PinAttribute::Dir) => Some(&m.dir),
            (Self::Motor(m), PinAttribute::Enable) => Some(&m.enable),
            (Self::Motor(m), PinAttribute::Uart) => m.uart.as_deref(),
            (Self::Motor(m), PinAttribute::Cs) => m.cs.as_deref(),
            (Self::Motor(m), PinAttribute::Diag) => m.diag.as_deref(),
            (Self::Simple { pin }, PinAttribute::Pin) => Some(pin),
            (Self::Probe { signal, .. }, PinAttribute::Signal) => Some(signal),
            (Self::Probe { servo, .. }, PinAttribute::Servo) => servo.as_deref(),
            _ => None,
        }
    }

    /// Attributes actually wired on this port, in a stable order.
    #[must_use]
    pub fn attributes(&self) -> Vec<PinAttribute> {
        let candidates: &[PinAttribute] = match self {
            Self::Motor(_) => &[
                PinAttribute::Step,
                PinAttribute::Dir,
                PinAttribute::Enable,
                PinAttribute::Uart,
                PinAttribute::Cs,
                PinAttribute::Diag,
            ],
            Self::Simple { .. } => &[PinAttribute::Pin],
            Self::Probe { .. } => &[PinAttribute::Signal, PinAttribute::Servo],
        };
        candidates
            .iter()
            .copied()
            .filter(|attr| self.raw(*attr).is_some())
            .collect()
    }
}

/// One physical connector on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    /// Stable id, unique within the board (e.g. "MOTOR0", "FAN2")
    pub id: String,
    /// Silkscreen label or note, if different from the id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Category this port belongs to
    pub category: PortCategory,
    /// Raw pins
    pub pins: PinSet,
}

/// A controller board and its ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    /// Catalog id (e.g. "btt-octopus-v1.1")
    pub id: String,
    /// Display name
    pub name: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Role the board is designed for
    pub role: BoardRole,
    /// MCU type, informational
    pub mcu: String,
    /// Ports in catalog order
    pub ports: Vec<Port>,
}

impl Board {
    /// Finds a port by id (case-insensitive).
    #[must_use]
    pub fn port(&self, port_id: &str) -> Option<&Port> {
        self.ports
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(port_id))
    }

    /// Ports of one category, in catalog order.
    pub fn ports_in(&self, category: PortCategory) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(move |p| p.category == category)
    }

    /// Categories this board has at least one port for.
    #[must_use]
    pub fn categories(&self) -> Vec<PortCategory> {
        PortCategory::ALL
            .into_iter()
            .filter(|c| self.ports_in(*c).next().is_some())
            .collect()
    }
}

/// A port address: which board role and which port id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Board role
    pub role: BoardRole,
    /// Port id
    pub port_id: String,
}

impl PortRef {
    /// Creates a port reference.
    pub fn new(role: BoardRole, port_id: impl Into<String>) -> Self {
        Self {
            role,
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.port_id)
    }
}

impl FromStr for PortRef {
    type Err = anyhow::Error;

    /// Parses `role:PORT`, e.g. `toolboard:FAN1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, port) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Expected '<role>:<port>', got '{s}'"))?;
        let port = port.trim();
        if port.is_empty() {
            anyhow::bail!("Port id cannot be empty in '{s}'");
        }
        Ok(Self::new(role.parse()?, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motor() -> PinSet {
        PinSet::Motor(MotorPins {
            step: "PF13".to_string(),
            dir: "PF12".to_string(),
            enable: "PF14".to_string(),
            uart: Some("PC4".to_string()),
            cs: None,
            diag: Some("PG6".to_string()),
        })
    }

    #[test]
    fn test_raw_motor_attributes() {
        let pins = motor();
        assert_eq!(pins.raw(PinAttribute::Step), Some("PF13"));
        assert_eq!(pins.raw(PinAttribute::Cs), None);
        assert_eq!(pins.raw(PinAttribute::Pin), None);
        assert_eq!(
            pins.attributes(),
            vec![
                PinAttribute::Step,
                PinAttribute::Dir,
                PinAttribute::Enable,
                PinAttribute::Uart,
                PinAttribute::Diag
            ]
        );
    }

    #[test]
    fn test_probe_without_servo() {
        let pins = PinSet::Probe {
            signal: "PB7".to_string(),
            servo: None,
        };
        assert_eq!(pins.raw(PinAttribute::Signal), Some("PB7"));
        assert_eq!(pins.raw(PinAttribute::Servo), None);
        assert_eq!(pins.attributes(), vec![PinAttribute::Signal]);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("toolboard".parse::<BoardRole>().unwrap(), BoardRole::Toolboard);
        assert_eq!("Mainboard".parse::<BoardRole>().unwrap(), BoardRole::Mainboard);
        assert!("probe-mcu".parse::<BoardRole>().is_err());
    }

    #[test]
    fn test_port_ref_parse() {
        let port: PortRef = "toolboard:FAN1".parse().unwrap();
        assert_eq!(port, PortRef::new(BoardRole::Toolboard, "FAN1"));
        assert_eq!(port.to_string(), "toolboard:FAN1");
        assert!("FAN1".parse::<PortRef>().is_err());
        assert!("mainboard:".parse::<PortRef>().is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("FAN".parse::<PortCategory>().unwrap(), PortCategory::Fan);
        assert!("valve".parse::<PortCategory>().is_err());
    }
}
