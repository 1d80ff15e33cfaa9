//! Scalar printer settings carried by a session.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Printer kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kinematics {
    /// Bed slinger / cartesian gantry
    Cartesian,
    /// CoreXY
    CoreXY,
    /// CoreXZ
    CoreXZ,
}

impl Kinematics {
    /// Klipper's name for the kinematics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cartesian => "cartesian",
            Self::CoreXY => "corexy",
            Self::CoreXZ => "corexz",
        }
    }
}

/// How the MCU talks to a stepper driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverInterface {
    /// Step/dir only
    Standalone,
    /// Single-wire UART
    Uart,
    /// SPI
    Spi,
}

/// Stepper driver model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    /// A4988 / DRV8825 style standalone driver
    A4988,
    /// TMC2208
    Tmc2208,
    /// TMC2209
    Tmc2209,
    /// TMC2130
    Tmc2130,
    /// TMC5160
    Tmc5160,
}

impl DriverType {
    /// Klipper section prefix for the driver.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A4988 => "a4988",
            Self::Tmc2208 => "tmc2208",
            Self::Tmc2209 => "tmc2209",
            Self::Tmc2130 => "tmc2130",
            Self::Tmc5160 => "tmc5160",
        }
    }

    /// Bus the driver is configured over.
    #[must_use]
    pub const fn interface(self) -> DriverInterface {
        match self {
            Self::A4988 => DriverInterface::Standalone,
            Self::Tmc2208 | Self::Tmc2209 => DriverInterface::Uart,
            Self::Tmc2130 | Self::Tmc5160 => DriverInterface::Spi,
        }
    }

    /// Whether the driver can report stalls on its DIAG line.
    #[must_use]
    pub const fn supports_stallguard(self) -> bool {
        matches!(self, Self::Tmc2209 | Self::Tmc2130 | Self::Tmc5160)
    }
}

/// Bed probe type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Inductive or capacitive sensor
    Inductive,
    /// BLTouch / 3DTouch (needs the servo pin)
    Bltouch,
    /// Klicky style dockable switch
    Klicky,
    /// Voron Tap style nozzle probe
    Tap,
}

impl ProbeKind {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inductive => "inductive",
            Self::Bltouch => "bltouch",
            Self::Klicky => "klicky",
            Self::Tap => "tap",
        }
    }

    /// Whether this probe needs a servo control line.
    #[must_use]
    pub const fn needs_servo(self) -> bool {
        matches!(self, Self::Bltouch)
    }
}

/// What triggers Z homing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZEndstopSource {
    /// Physical Z endstop switch
    #[default]
    Switch,
    /// Probe used as virtual endstop
    Probe,
}

impl ZEndstopSource {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Probe => "probe",
        }
    }
}

macro_rules! impl_parse_display {
    ($ty:ty, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim();
                [$($variant),+]
                    .into_iter()
                    .find(|v: &$ty| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid value '{}'. Expected one of: {}",
                            wanted,
                            [$($variant.as_str()),+].join(", ")
                        )
                    })
            }
        }
    };
}

impl_parse_display!(Kinematics, [Kinematics::Cartesian, Kinematics::CoreXY, Kinematics::CoreXZ]);
impl_parse_display!(
    DriverType,
    [
        DriverType::A4988,
        DriverType::Tmc2208,
        DriverType::Tmc2209,
        DriverType::Tmc2130,
        DriverType::Tmc5160,
    ]
);
impl_parse_display!(
    ProbeKind,
    [ProbeKind::Inductive, ProbeKind::Bltouch, ProbeKind::Klicky, ProbeKind::Tap]
);
impl_parse_display!(ZEndstopSource, [ZEndstopSource::Switch, ZEndstopSource::Probe]);

/// Default max velocity in mm/s.
pub const DEFAULT_MAX_VELOCITY: u32 = 300;
/// Default max acceleration in mm/s².
pub const DEFAULT_MAX_ACCEL: u32 = 3000;
/// Default run current in mA.
pub const DEFAULT_RUN_CURRENT_MA: u32 = 800;
/// Default microsteps.
pub const DEFAULT_MICROSTEPS: u16 = 16;

/// Setting keys, in the order they are persisted.
pub const SETTING_KEYS: [&str; 15] = [
    "printer.kinematics",
    "printer.bed_size_x",
    "printer.bed_size_y",
    "printer.z_height",
    "printer.max_velocity",
    "printer.max_accel",
    "stepper.driver",
    "stepper.run_current_ma",
    "stepper.microsteps",
    "extruder.sensor_type",
    "bed.sensor_type",
    "probe.type",
    "z_endstop.source",
    "mcu.serial",
    "toolboard.canbus_uuid",
];

/// Scalar fields of a configuration session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Printer kinematics (required for rendering)
    #[serde(default)]
    pub kinematics: Option<Kinematics>,
    /// Bed size along X in mm (required)
    #[serde(default)]
    pub bed_size_x: Option<u32>,
    /// Bed size along Y in mm (required)
    #[serde(default)]
    pub bed_size_y: Option<u32>,
    /// Usable Z height in mm
    #[serde(default)]
    pub z_height: Option<u32>,
    /// Max velocity in mm/s
    #[serde(default = "default_max_velocity")]
    pub max_velocity: u32,
    /// Max acceleration in mm/s²
    #[serde(default = "default_max_accel")]
    pub max_accel: u32,
    /// Stepper driver model
    #[serde(default)]
    pub driver: Option<DriverType>,
    /// Driver run current in mA
    #[serde(default = "default_run_current")]
    pub run_current_ma: u32,
    /// Microsteps per full step
    #[serde(default = "default_microsteps")]
    pub microsteps: u16,
    /// Hotend thermistor sensor type
    #[serde(default)]
    pub extruder_sensor_type: Option<String>,
    /// Bed thermistor sensor type
    #[serde(default)]
    pub bed_sensor_type: Option<String>,
    /// Probe type
    #[serde(default)]
    pub probe_type: Option<ProbeKind>,
    /// Z homing source
    #[serde(default)]
    pub z_endstop: ZEndstopSource,
    /// Mainboard serial device path
    #[serde(default)]
    pub mcu_serial: Option<String>,
    /// Toolboard CAN bus UUID
    #[serde(default)]
    pub toolboard_canbus_uuid: Option<String>,
}

fn default_max_velocity() -> u32 {
    DEFAULT_MAX_VELOCITY
}

fn default_max_accel() -> u32 {
    DEFAULT_MAX_ACCEL
}

fn default_run_current() -> u32 {
    DEFAULT_RUN_CURRENT_MA
}

fn default_microsteps() -> u16 {
    DEFAULT_MICROSTEPS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kinematics: None,
            bed_size_x: None,
            bed_size_y: None,
            z_height: None,
            max_velocity: DEFAULT_MAX_VELOCITY,
            max_accel: DEFAULT_MAX_ACCEL,
            driver: None,
            run_current_ma: DEFAULT_RUN_CURRENT_MA,
            microsteps: DEFAULT_MICROSTEPS,
            extruder_sensor_type: None,
            bed_sensor_type: None,
            probe_type: None,
            z_endstop: ZEndstopSource::Switch,
            mcu_serial: None,
            toolboard_canbus_uuid: None,
        }
    }
}

impl Settings {
    /// Sets a scalar by its namespaced key.
    ///
    /// Returns `Ok(false)` for keys that are not settings, so callers can try
    /// other namespaces or ignore the key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        let value = value.trim();
        match key {
            "printer.kinematics" => self.kinematics = Some(value.parse()?),
            "printer.bed_size_x" => self.bed_size_x = Some(parse_positive(key, value)?),
            "printer.bed_size_y" => self.bed_size_y = Some(parse_positive(key, value)?),
            "printer.z_height" => self.z_height = Some(parse_positive(key, value)?),
            "printer.max_velocity" => self.max_velocity = parse_positive(key, value)?,
            "printer.max_accel" => self.max_accel = parse_positive(key, value)?,
            "stepper.driver" => self.driver = Some(value.parse()?),
            "stepper.run_current_ma" => self.run_current_ma = parse_positive(key, value)?,
            "stepper.microsteps" => {
                let microsteps: u16 = value
                    .parse()
                    .with_context(|| format!("Invalid number for {key}: '{value}'"))?;
                if !microsteps.is_power_of_two() || microsteps > 256 {
                    anyhow::bail!("{key} must be a power of two up to 256, got {microsteps}");
                }
                self.microsteps = microsteps;
            }
            "extruder.sensor_type" => self.extruder_sensor_type = non_empty(value),
            "bed.sensor_type" => self.bed_sensor_type = non_empty(value),
            "probe.type" => self.probe_type = Some(value.parse()?),
            "z_endstop.source" => self.z_endstop = value.parse()?,
            "mcu.serial" => self.mcu_serial = non_empty(value),
            "toolboard.canbus_uuid" => self.toolboard_canbus_uuid = non_empty(value),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Clears an optional scalar back to unset (or a defaulted one back to
    /// its default). Returns `false` for unknown keys.
    pub fn unset(&mut self, key: &str) -> bool {
        let defaults = Self::default();
        match key {
            "printer.kinematics" => self.kinematics = None,
            "printer.bed_size_x" => self.bed_size_x = None,
            "printer.bed_size_y" => self.bed_size_y = None,
            "printer.z_height" => self.z_height = None,
            "printer.max_velocity" => self.max_velocity = defaults.max_velocity,
            "printer.max_accel" => self.max_accel = defaults.max_accel,
            "stepper.driver" => self.driver = None,
            "stepper.run_current_ma" => self.run_current_ma = defaults.run_current_ma,
            "stepper.microsteps" => self.microsteps = defaults.microsteps,
            "extruder.sensor_type" => self.extruder_sensor_type = None,
            "bed.sensor_type" => self.bed_sensor_type = None,
            "probe.type" => self.probe_type = None,
            "z_endstop.source" => self.z_endstop = defaults.z_endstop,
            "mcu.serial" => self.mcu_serial = None,
            "toolboard.canbus_uuid" => self.toolboard_canbus_uuid = None,
            _ => return false,
        }
        true
    }

    /// Current value of a setting, `None` when unset.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "printer.kinematics" => self.kinematics.map(|k| k.to_string()),
            "printer.bed_size_x" => self.bed_size_x.map(|v| v.to_string()),
            "printer.bed_size_y" => self.bed_size_y.map(|v| v.to_string()),
            "printer.z_height" => self.z_height.map(|v| v.to_string()),
            "printer.max_velocity" => Some(self.max_velocity.to_string()),
            "printer.max_accel" => Some(self.max_accel.to_string()),
            "stepper.driver" => self.driver.map(|d| d.to_string()),
            "stepper.run_current_ma" => Some(self.run_current_ma.to_string()),
            "stepper.microsteps" => Some(self.microsteps.to_string()),
            "extruder.sensor_type" => self.extruder_sensor_type.clone(),
            "bed.sensor_type" => self.bed_sensor_type.clone(),
            "probe.type" => self.probe_type.map(|p| p.to_string()),
            "z_endstop.source" => Some(self.z_endstop.to_string()),
            "mcu.serial" => self.mcu_serial.clone(),
            "toolboard.canbus_uuid" => self.toolboard_canbus_uuid.clone(),
            _ => None,
        }
    }

    /// All set values as `(key, value)` pairs, in persistence order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        SETTING_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    let parsed: u32 = value
        .parse()
        .with_context(|| format!("Invalid number for {key}: '{value}'"))?;
    if parsed == 0 {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(parsed)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
