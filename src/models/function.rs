//! Logical printer functions that consume board ports.

use crate::models::PortCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stepper axes, including extra motors for AWD and multi-Z setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X
    X,
    /// Second X motor
    X1,
    /// Y
    Y,
    /// Second Y motor
    Y1,
    /// Z
    Z,
    /// Z1
    Z1,
    /// Z2
    Z2,
    /// Z3
    Z3,
}

impl Axis {
    /// Whether this is one of the three primary axes.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Z)
    }

    /// Axis this motor moves (X1 → X, Z2 → Z).
    #[must_use]
    pub const fn base(self) -> HomingAxis {
        match self {
            Self::X | Self::X1 => HomingAxis::X,
            Self::Y | Self::Y1 => HomingAxis::Y,
            Self::Z | Self::Z1 | Self::Z2 | Self::Z3 => HomingAxis::Z,
        }
    }
}

/// Axes that home against an endstop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HomingAxis {
    /// X
    X,
    /// Y
    Y,
    /// Z
    Z,
}

/// Named fans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FanKind {
    /// Part cooling fan
    PartCooling,
    /// Hotend heatsink fan
    Hotend,
    /// Electronics bay fan
    Controller,
    /// Exhaust fan
    Exhaust,
    /// Chamber circulation fan
    Chamber,
    /// Filter (nevermore style) fan
    Filter,
    /// Water-cooling radiator fan
    Radiator,
}

/// A named consumer of one or two ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LogicalFunction {
    /// Axis stepper motor
    Stepper(Axis),
    /// Extruder motor
    Extruder,
    /// Hotend heater cartridge
    ExtruderHeater,
    /// Hotend thermistor
    ExtruderThermistor,
    /// Heated bed
    BedHeater,
    /// Bed thermistor
    BedThermistor,
    /// Fan
    Fan(FanKind),
    /// Bed probe
    Probe,
    /// Axis endstop switch
    Endstop(HomingAxis),
    /// Case light output
    CaseLight,
}

impl LogicalFunction {
    /// Every function, in rendering order.
    pub const ALL: [Self; 25] = [
        Self::Stepper(Axis::X),
        Self::Stepper(Axis::X1),
        Self::Stepper(Axis::Y),
        Self::Stepper(Axis::Y1),
        Self::Stepper(Axis::Z),
        Self::Stepper(Axis::Z1),
        Self::Stepper(Axis::Z2),
        Self::Stepper(Axis::Z3),
        Self::Extruder,
        Self::ExtruderHeater,
        Self::ExtruderThermistor,
        Self::BedHeater,
        Self::BedThermistor,
        Self::Fan(FanKind::PartCooling),
        Self::Fan(FanKind::Hotend),
        Self::Fan(FanKind::Controller),
        Self::Fan(FanKind::Exhaust),
        Self::Fan(FanKind::Chamber),
        Self::Fan(FanKind::Filter),
        Self::Fan(FanKind::Radiator),
        Self::Probe,
        Self::Endstop(HomingAxis::X),
        Self::Endstop(HomingAxis::Y),
        Self::Endstop(HomingAxis::Z),
        Self::CaseLight,
    ];

    /// Key used in session files, the CLI, and the web API.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Stepper(Axis::X) => "stepper_x",
            Self::Stepper(Axis::X1) => "stepper_x1",
            Self::Stepper(Axis::Y) => "stepper_y",
            Self::Stepper(Axis::Y1) => "stepper_y1",
            Self::Stepper(Axis::Z) => "stepper_z",
            Self::Stepper(Axis::Z1) => "stepper_z1",
            Self::Stepper(Axis::Z2) => "stepper_z2",
            Self::Stepper(Axis::Z3) => "stepper_z3",
            Self::Extruder => "extruder",
            Self::ExtruderHeater => "extruder_heater",
            Self::ExtruderThermistor => "extruder_thermistor",
            Self::BedHeater => "bed_heater",
            Self::BedThermistor => "bed_thermistor",
            Self::Fan(FanKind::PartCooling) => "fan_part",
            Self::Fan(FanKind::Hotend) => "fan_hotend",
            Self::Fan(FanKind::Controller) => "fan_controller",
            Self::Fan(FanKind::Exhaust) => "fan_exhaust",
            Self::Fan(FanKind::Chamber) => "fan_chamber",
            Self::Fan(FanKind::Filter) => "fan_filter",
            Self::Fan(FanKind::Radiator) => "fan_radiator",
            Self::Probe => "probe",
            Self::Endstop(HomingAxis::X) => "endstop_x",
            Self::Endstop(HomingAxis::Y) => "endstop_y",
            Self::Endstop(HomingAxis::Z) => "endstop_z",
            Self::CaseLight => "caselight",
        }
    }

    /// Human readable description for pickers.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Stepper(Axis::X | Axis::Y | Axis::Z) => "Axis stepper motor",
            Self::Stepper(_) => "Additional axis stepper motor",
            Self::Extruder => "Extruder stepper motor",
            Self::ExtruderHeater => "Hotend heater",
            Self::ExtruderThermistor => "Hotend thermistor",
            Self::BedHeater => "Heated bed",
            Self::BedThermistor => "Bed thermistor",
            Self::Fan(FanKind::PartCooling) => "Part cooling fan",
            Self::Fan(FanKind::Hotend) => "Hotend fan",
            Self::Fan(FanKind::Controller) => "Controller fan",
            Self::Fan(FanKind::Exhaust) => "Exhaust fan",
            Self::Fan(FanKind::Chamber) => "Chamber fan",
            Self::Fan(FanKind::Filter) => "Filter fan",
            Self::Fan(FanKind::Radiator) => "Radiator fan",
            Self::Probe => "Bed probe",
            Self::Endstop(_) => "Endstop switch",
            Self::CaseLight => "Case light",
        }
    }

    /// Port category this function can be assigned to.
    #[must_use]
    pub const fn category(self) -> PortCategory {
        match self {
            Self::Stepper(_) | Self::Extruder => PortCategory::Motor,
            Self::ExtruderHeater | Self::BedHeater => PortCategory::Heater,
            Self::ExtruderThermistor | Self::BedThermistor => PortCategory::Thermistor,
            Self::Fan(_) => PortCategory::Fan,
            Self::Probe => PortCategory::Probe,
            Self::Endstop(_) => PortCategory::Endstop,
            Self::CaseLight => PortCategory::Misc,
        }
    }

    /// Multi-pin functions may drive a second port in parallel.
    #[must_use]
    pub const fn supports_secondary(self) -> bool {
        matches!(self, Self::Fan(_))
    }

    /// Inputs that need the MCU's internal pull-up.
    #[must_use]
    pub const fn needs_pullup(self) -> bool {
        matches!(self, Self::Endstop(_) | Self::Probe)
    }
}

impl fmt::Display for LogicalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LogicalFunction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "fan_part_cooling" | "part_fan" | "fan" => "fan_part",
            "heater_bed" => "bed_heater",
            "hotend_fan" => "fan_hotend",
            "controller_fan" => "fan_controller",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|f| f.key() == alias)
            .ok_or_else(|| anyhow::anyhow!("Unknown function '{s}'"))
    }
}

impl From<LogicalFunction> for String {
    fn from(function: LogicalFunction) -> Self {
        function.key().to_string()
    }
}

impl TryFrom<String> for LogicalFunction {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Role a port plays within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    /// The function's main port
    Primary,
    /// Parallel second output of a multi-pin function
    Secondary,
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

/// Which slots a clear operation removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSelector {
    /// Primary only (drops the secondary too, it cannot outlive the primary)
    Primary,
    /// Secondary only
    Secondary,
    /// Both slots
    #[default]
    Both,
}

impl FromStr for SlotSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "both" | "all" => Ok(Self::Both),
            other => anyhow::bail!("Unknown slot '{other}'. Expected primary, secondary or both"),
        }
    }
}

/// Per-function pin modifiers chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinOptions {
    /// Line is active-low (e.g. normally-closed switch)
    #[serde(default)]
    pub invert: bool,
    /// Do not enable the pull-up even if the function normally wants one
    #[serde(default)]
    pub suppress_pullup: bool,
}

impl PinOptions {
    /// Whether these are the default options.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_and_parse_back() {
        let mut seen = std::collections::HashSet::new();
        for function in LogicalFunction::ALL {
            assert!(seen.insert(function.key()), "duplicate key {}", function);
            assert_eq!(function.key().parse::<LogicalFunction>().unwrap(), function);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(
            "hotend_fan".parse::<LogicalFunction>().unwrap(),
            LogicalFunction::Fan(FanKind::Hotend)
        );
        assert_eq!(
            "HEATER_BED".parse::<LogicalFunction>().unwrap(),
            LogicalFunction::BedHeater
        );
        assert!("stepper_w".parse::<LogicalFunction>().is_err());
    }

    #[test]
    fn test_capabilities() {
        assert!(LogicalFunction::Fan(FanKind::Exhaust).supports_secondary());
        assert!(!LogicalFunction::Stepper(Axis::X).supports_secondary());
        assert!(LogicalFunction::Probe.needs_pullup());
        assert!(LogicalFunction::Endstop(HomingAxis::Z).needs_pullup());
        assert!(!LogicalFunction::BedHeater.needs_pullup());
        assert_eq!(LogicalFunction::Extruder.category(), PortCategory::Motor);
        assert_eq!(LogicalFunction::CaseLight.category(), PortCategory::Misc);
    }

    #[test]
    fn test_axis_base() {
        assert_eq!(Axis::Z2.base(), HomingAxis::Z);
        assert!(!Axis::Y1.is_primary());
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&LogicalFunction::Fan(FanKind::Hotend)).unwrap();
        assert_eq!(json, "\"fan_hotend\"");
        let back: LogicalFunction = serde_json::from_str("\"stepper_z1\"").unwrap();
        assert_eq!(back, LogicalFunction::Stepper(Axis::Z1));
    }
}
