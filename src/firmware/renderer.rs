//! Klipper config rendering.
//!
//! Turns a session into `printer.cfg` (and `toolboard.cfg` when a toolboard
//! is selected). Rendering is pure: the same session always yields
//! byte-identical text, and nothing is written to disk here.

// Allow format! appended to String - more readable for building config text
#![allow(clippy::format_push_string)]

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::validator::{
    driver_profile, homing_source, DriverProfile, HomingSource, SessionValidator,
    DEFAULT_SENSOR_TYPE,
};
use crate::error::ConfigResult;
use crate::models::{
    Axis, BoardRole, DriverInterface, DriverType, FanKind, HomingAxis, Kinematics,
    LogicalFunction, PinAttribute, ProbeKind, Session, SlotRole, ZEndstopSource,
};
use crate::pins::PLACEHOLDER_PIN;

/// Main config file name.
pub const PRINTER_CFG: &str = "printer.cfg";
/// Toolboard config file name.
pub const TOOLBOARD_CFG: &str = "toolboard.cfg";

const PLACEHOLDER_SERIAL: &str = "/dev/serial/by-id/REPLACE_SERIAL";
const PLACEHOLDER_UUID: &str = "REPLACE_UUID";
const DEFAULT_BED_SIZE: u32 = 200;
const DEFAULT_Z_HEIGHT: u32 = 250;

/// How unconfigured fields are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Refuse to render while required fields are missing
    #[default]
    Strict,
    /// Always render, marking gaps with `REPLACE_PIN`
    Placeholder,
}

impl RenderMode {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "placeholder" | "preview" => Ok(Self::Placeholder),
            other => anyhow::bail!("Unknown render mode '{other}'. Expected strict or placeholder"),
        }
    }
}

/// Rendered files plus the validator's warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedConfig {
    files: BTreeMap<String, String>,
    warnings: Vec<String>,
}

impl RenderedConfig {
    /// Text of one file.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// All files, ordered by name.
    #[must_use]
    pub const fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Non-blocking findings, in validator order.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Splits into files and warnings.
    #[must_use]
    pub fn into_parts(self) -> (BTreeMap<String, String>, Vec<String>) {
        (self.files, self.warnings)
    }

    /// Writes every file into `dir` (created if needed), atomically per file.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let mut written = Vec::with_capacity(self.files.len());
        for (name, text) in &self.files {
            let path = dir.join(name);
            let temp_path = path.with_extension("cfg.tmp");
            std::fs::write(&temp_path, text)
                .with_context(|| format!("Failed to write temporary file: {}", temp_path.display()))?;
            std::fs::rename(&temp_path, &path)
                .with_context(|| format!("Failed to rename to: {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Renders a session.
///
/// In [`RenderMode::Strict`] a session with missing required fields yields
/// `MissingRequiredField` (or `AttributeUnavailable` for an unwired probe
/// servo) and no text at all.
pub fn render(session: &Session, mode: RenderMode) -> ConfigResult<RenderedConfig> {
    let report = SessionValidator::new(session).validate();

    if mode == RenderMode::Strict {
        if let Some(err) = report.to_config_error() {
            return Err(err);
        }
    }

    let mut warnings: Vec<String> = report.errors.iter().map(|e| e.message.clone()).collect();
    warnings.extend(report.warnings.iter().map(ToString::to_string));

    let files = ConfigRenderer::new(session).render();
    tracing::debug!(%mode, files = files.len(), warnings = warnings.len(), "rendered config");
    Ok(RenderedConfig { files, warnings })
}

/// One INI-like output file.
#[derive(Debug, Default)]
struct CfgFile {
    text: String,
}

impl CfgFile {
    fn section(&mut self, header: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(&format!("[{header}]\n"));
    }

    fn entry(&mut self, key: &str, value: impl fmt::Display) {
        self.text.push_str(&format!("{key}: {value}\n"));
    }

    fn comment(&mut self, text: &str) {
        self.text.push_str(&format!("# {text}\n"));
    }
}

struct ConfigRenderer<'a> {
    session: &'a Session,
    printer: CfgFile,
    toolboard: Option<CfgFile>,
}

impl<'a> ConfigRenderer<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            session,
            printer: CfgFile::default(),
            toolboard: session
                .board(BoardRole::Toolboard)
                .map(|_| CfgFile::default()),
        }
    }

    fn render(mut self) -> BTreeMap<String, String> {
        self.render_header();
        self.render_mcus();
        self.render_printer();

        for function in LogicalFunction::ALL {
            if let LogicalFunction::Stepper(axis) = function {
                self.render_stepper(axis);
            }
        }
        self.render_extruder();
        self.render_bed();
        for function in LogicalFunction::ALL {
            if let LogicalFunction::Fan(kind) = function {
                self.render_fan(kind);
            }
        }
        self.render_probe();
        self.render_caselight();

        let mut files = BTreeMap::new();
        files.insert(PRINTER_CFG.to_string(), self.printer.text);
        if let Some(toolboard) = self.toolboard {
            files.insert(TOOLBOARD_CFG.to_string(), toolboard.text);
        }
        files
    }

    /// File a function's sections belong in.
    fn file_for(&mut self, function: LogicalFunction) -> &mut CfgFile {
        let role = self
            .session
            .assignment(function, SlotRole::Primary)
            .map(|a| a.port.role)
            .or_else(|| self.session.location(function))
            .unwrap_or(BoardRole::Mainboard);
        match (role, self.toolboard.as_mut()) {
            (BoardRole::Toolboard, Some(toolboard)) => toolboard,
            _ => &mut self.printer,
        }
    }

    /// Resolved pin, or the placeholder when the slot is unassigned.
    fn pin(&self, function: LogicalFunction, slot: SlotRole, attribute: PinAttribute) -> String {
        self.session
            .resolved(function, slot)
            .and_then(|pins| pins.get(attribute))
            .unwrap_or(PLACEHOLDER_PIN)
            .to_string()
    }

    fn bed_size(&self) -> (u32, u32) {
        let settings = &self.session.settings;
        (
            settings.bed_size_x.unwrap_or(DEFAULT_BED_SIZE),
            settings.bed_size_y.unwrap_or(DEFAULT_BED_SIZE),
        )
    }

    fn render_header(&mut self) {
        let session = self.session;
        let file = &mut self.printer;
        file.comment("Generated by klipconf");
        match session.board(BoardRole::Mainboard) {
            Some(id) => file.comment(&format!("mainboard: {id}")),
            None => file.comment("mainboard: not selected"),
        }
        if let Some(id) = session.board(BoardRole::Toolboard) {
            file.comment(&format!("toolboard: {id}"));
            file.text.push('\n');
            file.text.push_str(&format!("[include {TOOLBOARD_CFG}]\n"));
        }

        if let Some(toolboard) = self.toolboard.as_mut() {
            toolboard.comment("Generated by klipconf");
            if let Some(id) = session.board(BoardRole::Toolboard) {
                toolboard.comment(&format!("toolboard: {id}"));
            }
        }
    }

    fn render_mcus(&mut self) {
        let settings = &self.session.settings;

        self.printer.section("mcu");
        match &settings.mcu_serial {
            Some(serial) => self.printer.entry("serial", serial),
            None => {
                self.printer.comment("set mcu.serial to the board's /dev/serial/by-id path");
                self.printer.entry("serial", PLACEHOLDER_SERIAL);
            }
        }

        if let Some(toolboard) = self.toolboard.as_mut() {
            toolboard.section("mcu toolboard");
            match &settings.toolboard_canbus_uuid {
                Some(uuid) => toolboard.entry("canbus_uuid", uuid),
                None => {
                    toolboard.comment("set toolboard.canbus_uuid to the board's CAN uuid");
                    toolboard.entry("canbus_uuid", PLACEHOLDER_UUID);
                }
            }
        }
    }

    fn render_printer(&mut self) {
        let settings = &self.session.settings;
        let file = &mut self.printer;

        file.section("printer");
        match settings.kinematics {
            Some(kinematics) => file.entry("kinematics", kinematics),
            None => {
                file.comment("printer.kinematics not set, using default");
                file.entry("kinematics", Kinematics::Cartesian);
            }
        }
        file.entry("max_velocity", settings.max_velocity);
        file.entry("max_accel", settings.max_accel);
        file.entry("max_z_velocity", 15);
        file.entry("max_z_accel", 350);
        file.entry("square_corner_velocity", "5.0");
    }

    fn render_stepper(&mut self, axis: Axis) {
        let function = LogicalFunction::Stepper(axis);
        // Extra motors only appear once assigned.
        if !axis.is_primary() && !self.session.is_assigned(function) {
            return;
        }

        let session = self.session;
        let settings = &session.settings;
        let (bed_x, bed_y) = self.bed_size();
        let bed_size_missing = match axis.base() {
            HomingAxis::X => settings.bed_size_x.is_none(),
            HomingAxis::Y => settings.bed_size_y.is_none(),
            HomingAxis::Z => false,
        };
        let homing = axis
            .is_primary()
            .then(|| homing_source(session, axis.base()));
        let step = self.pin(function, SlotRole::Primary, PinAttribute::Step);
        let dir = self.pin(function, SlotRole::Primary, PinAttribute::Dir);
        let enable = self.pin(function, SlotRole::Primary, PinAttribute::Enable);
        let endstop = LogicalFunction::Endstop(axis.base());
        let endstop_pin = self.pin(endstop, SlotRole::Primary, PinAttribute::Pin);

        let file = self.file_for(function);
        file.section(function.key());
        file.entry("step_pin", step);
        file.entry("dir_pin", dir);
        file.entry("enable_pin", enable);
        file.entry("microsteps", settings.microsteps);
        file.entry(
            "rotation_distance",
            if axis.base() == HomingAxis::Z { 8 } else { 40 },
        );

        if let Some(homing) = homing {
            match &homing {
                HomingSource::Switch(pin) => file.entry("endstop_pin", pin),
                HomingSource::Sensorless(driver) => {
                    file.entry("endstop_pin", format!("{driver}_{}:virtual_endstop", function.key()));
                    file.entry("homing_retract_dist", 0);
                }
                HomingSource::Probe => file.entry("endstop_pin", "probe:z_virtual_endstop"),
                HomingSource::Missing => file.entry("endstop_pin", endstop_pin),
            }

            match axis.base() {
                HomingAxis::X | HomingAxis::Y => {
                    let max = if axis.base() == HomingAxis::X { bed_x } else { bed_y };
                    file.entry("position_endstop", 0);
                    if bed_size_missing {
                        file.comment("bed size not set, using default");
                    }
                    file.entry("position_max", max);
                    file.entry("homing_speed", 50);
                }
                HomingAxis::Z => {
                    if homing == HomingSource::Probe {
                        file.entry("position_min", -5);
                    } else {
                        file.entry("position_endstop", 0);
                    }
                    file.entry("position_max", settings.z_height.unwrap_or(DEFAULT_Z_HEIGHT));
                    file.entry("homing_speed", 10);
                }
            }
        }

        self.render_driver(function);
    }

    fn render_driver(&mut self, motor: LogicalFunction) {
        if !self.session.is_assigned(motor) {
            return;
        }
        let session = self.session;
        let sensorless = match motor {
            LogicalFunction::Stepper(axis @ (Axis::X | Axis::Y)) => {
                matches!(homing_source(session, axis.base()), HomingSource::Sensorless(_))
            }
            _ => false,
        };
        let diag = self.pin(motor, SlotRole::Primary, PinAttribute::Diag);
        let port = session
            .assignment(motor, SlotRole::Primary)
            .map(|a| a.port.port_id.clone())
            .unwrap_or_default();
        let run_current = format!("{:.3}", f64::from(session.settings.run_current_ma) / 1000.0);

        let file = self.file_for(motor);
        match driver_profile(session, motor) {
            DriverProfile::Basic => {}
            DriverProfile::Fallback { driver, missing } => {
                file.comment(&format!(
                    "{driver} driver not configured: {port} has no {missing} pin"
                ));
            }
            DriverProfile::Tmc { driver, bus_pin } => {
                file.section(&format!("{driver} {}", motor.key()));
                match driver.interface() {
                    DriverInterface::Spi => file.entry("cs_pin", bus_pin),
                    _ => file.entry("uart_pin", bus_pin),
                }
                file.entry("run_current", run_current);
                if driver == DriverType::Tmc5160 {
                    file.entry("sense_resistor", "0.075");
                }
                file.entry("stealthchop_threshold", 0);
                if sensorless {
                    file.entry("diag_pin", diag);
                    if driver == DriverType::Tmc2209 {
                        file.entry("driver_SGTHRS", 100);
                    } else {
                        file.entry("driver_SGT", 0);
                    }
                }
            }
        }
    }

    fn render_extruder(&mut self) {
        let motor = LogicalFunction::Extruder;
        let heater = LogicalFunction::ExtruderHeater;
        let thermistor = LogicalFunction::ExtruderThermistor;

        let step = self.pin(motor, SlotRole::Primary, PinAttribute::Step);
        let dir = self.pin(motor, SlotRole::Primary, PinAttribute::Dir);
        let enable = self.pin(motor, SlotRole::Primary, PinAttribute::Enable);
        let heater_pin = self.pin(heater, SlotRole::Primary, PinAttribute::Pin);
        let sensor_pin = self.pin(thermistor, SlotRole::Primary, PinAttribute::Pin);
        let settings = &self.session.settings;
        let sensor_type = settings
            .extruder_sensor_type
            .clone()
            .unwrap_or_else(|| DEFAULT_SENSOR_TYPE.to_string());
        let microsteps = settings.microsteps;

        let anchor = if self.session.is_assigned(motor) { motor } else { heater };
        let file = self.file_for(anchor);
        file.section("extruder");
        file.entry("step_pin", step);
        file.entry("dir_pin", dir);
        file.entry("enable_pin", enable);
        file.entry("microsteps", microsteps);
        file.entry("rotation_distance", "22.6789511");
        file.entry("nozzle_diameter", "0.400");
        file.entry("filament_diameter", "1.750");
        file.entry("heater_pin", heater_pin);
        file.entry("sensor_type", sensor_type);
        file.entry("sensor_pin", sensor_pin);
        file.entry("control", "pid");
        file.entry("pid_Kp", "21.527");
        file.entry("pid_Ki", "1.063");
        file.entry("pid_Kd", "108.982");
        file.entry("min_temp", 0);
        file.entry("max_temp", 270);

        self.render_driver(motor);
    }

    fn render_bed(&mut self) {
        let heater = LogicalFunction::BedHeater;
        let thermistor = LogicalFunction::BedThermistor;
        if !self.session.is_assigned(heater) && !self.session.is_assigned(thermistor) {
            return;
        }

        let heater_pin = self.pin(heater, SlotRole::Primary, PinAttribute::Pin);
        let sensor_pin = self.pin(thermistor, SlotRole::Primary, PinAttribute::Pin);
        let sensor_type = self
            .session
            .settings
            .bed_sensor_type
            .clone()
            .unwrap_or_else(|| DEFAULT_SENSOR_TYPE.to_string());

        let file = self.file_for(heater);
        file.section("heater_bed");
        file.entry("heater_pin", heater_pin);
        file.entry("sensor_type", sensor_type);
        file.entry("sensor_pin", sensor_pin);
        file.entry("control", "watermark");
        file.entry("min_temp", 0);
        file.entry("max_temp", 120);
    }

    fn render_fan(&mut self, kind: FanKind) {
        let function = LogicalFunction::Fan(kind);
        if !self.session.is_assigned(function) {
            return;
        }

        let (section, name) = fan_section(kind);
        let primary = self.pin(function, SlotRole::Primary, PinAttribute::Pin);
        let secondary = self
            .session
            .resolved(function, SlotRole::Secondary)
            .and_then(|pins| pins.get(PinAttribute::Pin))
            .map(str::to_string);

        let file = self.file_for(function);
        let pin = match secondary {
            Some(secondary) => {
                let group = format!("{name}_pins");
                file.section(&format!("multi_pin {group}"));
                file.entry("pins", format!("{primary}, {secondary}"));
                format!("multi_pin:{group}")
            }
            None => primary,
        };

        match section {
            "fan" => file.section("fan"),
            _ => file.section(&format!("{section} {name}")),
        }
        file.entry("pin", pin);
        match kind {
            FanKind::Hotend | FanKind::Radiator => {
                file.entry("heater", "extruder");
                file.entry("heater_temp", "50.0");
            }
            FanKind::Controller => file.entry("idle_timeout", 60),
            _ => {}
        }
    }

    fn render_probe(&mut self) {
        let probe = LogicalFunction::Probe;
        let settings = &self.session.settings;
        let z_probe = settings.z_endstop == ZEndstopSource::Probe;
        if !self.session.is_assigned(probe) && !z_probe {
            return;
        }

        let signal = self.pin(probe, SlotRole::Primary, PinAttribute::Signal);
        let servo = self.pin(probe, SlotRole::Primary, PinAttribute::Servo);
        let kind = settings.probe_type.unwrap_or(ProbeKind::Inductive);
        let (bed_x, bed_y) = self.bed_size();

        let file = self.file_for(probe);
        if kind == ProbeKind::Bltouch {
            file.section("bltouch");
            file.entry("sensor_pin", signal);
            file.entry("control_pin", servo);
        } else {
            file.section("probe");
            file.entry("pin", signal);
        }
        file.entry("x_offset", 0);
        file.entry("y_offset", 0);
        file.comment("calibrate with PROBE_CALIBRATE");
        file.entry("z_offset", 0);
        file.entry("speed", 5);
        file.entry("samples", 3);

        if !z_probe {
            return;
        }
        let file = &mut self.printer;
        file.section("safe_z_home");
        file.entry("home_xy_position", format!("{}, {}", bed_x / 2, bed_y / 2));
        file.entry("z_hop", 10);
        file.section("bed_mesh");
        file.entry("speed", 120);
        file.entry("mesh_min", "10, 10");
        file.entry(
            "mesh_max",
            format!("{}, {}", bed_x.saturating_sub(10), bed_y.saturating_sub(10)),
        );
        file.entry("probe_count", "5, 5");
    }

    fn render_caselight(&mut self) {
        let function = LogicalFunction::CaseLight;
        if !self.session.is_assigned(function) {
            return;
        }
        let pin = self.pin(function, SlotRole::Primary, PinAttribute::Pin);
        let file = self.file_for(function);
        file.section("output_pin caselight");
        file.entry("pin", pin);
        file.entry("pwm", "true");
        file.entry("value", 0);
    }
}

/// Section type and object name for a fan.
const fn fan_section(kind: FanKind) -> (&'static str, &'static str) {
    match kind {
        FanKind::PartCooling => ("fan", "part_fan"),
        FanKind::Hotend => ("heater_fan", "hotend_fan"),
        FanKind::Controller => ("controller_fan", "controller_fan"),
        FanKind::Exhaust => ("fan_generic", "exhaust_fan"),
        FanKind::Chamber => ("fan_generic", "chamber_fan"),
        FanKind::Filter => ("fan_generic", "filter_fan"),
        FanKind::Radiator => ("heater_fan", "radiator_fan"),
    }
}
