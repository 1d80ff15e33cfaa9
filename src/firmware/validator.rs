//! Session validation before rendering.
//!
//! The validator decides whether a session carries everything a strict
//! render needs. Placeholder renders run it too and surface its findings as
//! warnings next to the preview.

// Allow format! appended to String - more readable for building messages
#![allow(clippy::format_push_string)]

use crate::constants::APP_BINARY_NAME;
use crate::error::ConfigError;
use crate::models::{
    Axis, BoardRole, DriverInterface, DriverType, HomingAxis, LogicalFunction, PinAttribute,
    PortRef, ProbeKind, Session, SlotRole, ZEndstopSource,
};

/// Validation result with specific errors and warnings.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Problems that block a strict render
    pub errors: Vec<ValidationError>,
    /// Non-critical warnings
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Creates a new empty validation report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true if there are no errors (warnings are allowed).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the report.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Field keys of every missing-field error, in check order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::MissingRequiredField)
            .map(|e| e.field.clone())
            .collect()
    }

    /// Typed error a strict render fails with, if any.
    ///
    /// Missing fields are reported together; otherwise the first unwired
    /// attribute wins.
    #[must_use]
    pub fn to_config_error(&self) -> Option<ConfigError> {
        let fields = self.missing_fields();
        if !fields.is_empty() {
            return Some(ConfigError::MissingRequiredField { fields });
        }
        self.errors.iter().find_map(|e| match (&e.port, e.attribute) {
            (Some(port), Some(attribute)) => Some(ConfigError::AttributeUnavailable {
                port_id: port.port_id.clone(),
                attribute,
            }),
            _ => None,
        })
    }

    /// Formats the report as a user-friendly error message.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut message = String::new();

        if !self.errors.is_empty() {
            message.push_str(&format!("❌ {} validation errors:\n", self.errors.len()));
            for (idx, error) in self.errors.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, error));
            }
        }

        if !self.warnings.is_empty() {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(&format!("⚠️  {} warnings:\n", self.warnings.len()));
            for (idx, warning) in self.warnings.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, warning));
            }
        }

        message
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Type of validation error
    pub kind: ValidationErrorKind,
    /// Session field or function key the error is about
    pub field: String,
    /// Port involved, if any
    pub port: Option<PortRef>,
    /// Pin attribute involved, if any
    pub attribute: Option<PinAttribute>,
    /// Human-readable error message
    pub message: String,
    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(kind: ValidationErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            port: None,
            attribute: None,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Sets the port context.
    #[must_use]
    pub fn with_port(mut self, port: PortRef, attribute: PinAttribute) -> Self {
        self.port = Some(port);
        self.attribute = Some(attribute);
        self
    }

    /// Sets a suggestion for fixing the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(port) = &self.port {
            write!(f, "[{port}] {}: {}", self.kind, self.message)?;
        } else {
            write!(f, "{}: {}", self.kind, self.message)?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n    → {suggestion}")?;
        }

        Ok(())
    }
}

/// Types of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required board, setting, or function is not configured
    MissingRequiredField,
    /// Port lacks a pin the configuration needs
    AttributeUnavailable,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredField => write!(f, "Missing Required Field"),
            Self::AttributeUnavailable => write!(f, "Attribute Unavailable"),
        }
    }
}

/// Validation warning (non-blocking).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Warning message
    pub message: String,
}

impl ValidationWarning {
    /// Creates a new validation warning
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Functions every printer config needs.
pub const REQUIRED_FUNCTIONS: [LogicalFunction; 6] = [
    LogicalFunction::Stepper(Axis::X),
    LogicalFunction::Stepper(Axis::Y),
    LogicalFunction::Stepper(Axis::Z),
    LogicalFunction::Extruder,
    LogicalFunction::ExtruderHeater,
    LogicalFunction::ExtruderThermistor,
];

/// What an axis homes against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HomingSource {
    /// Endstop switch on a resolved pin
    Switch(String),
    /// Driver stall detection over the DIAG line
    Sensorless(DriverType),
    /// Probe acting as Z endstop
    Probe,
    /// Nothing usable configured
    Missing,
}

pub(crate) fn homing_source(session: &Session, axis: HomingAxis) -> HomingSource {
    if axis == HomingAxis::Z && session.settings.z_endstop == ZEndstopSource::Probe {
        return HomingSource::Probe;
    }
    if let Some(pin) = session
        .resolved(LogicalFunction::Endstop(axis), SlotRole::Primary)
        .and_then(|pins| pins.get(PinAttribute::Pin))
    {
        return HomingSource::Switch(pin.to_string());
    }

    let stepper = match axis {
        HomingAxis::X => LogicalFunction::Stepper(Axis::X),
        HomingAxis::Y => LogicalFunction::Stepper(Axis::Y),
        // Stall detection is unreliable on Z leadscrews.
        HomingAxis::Z => return HomingSource::Missing,
    };
    let has_diag = session
        .resolved(stepper, SlotRole::Primary)
        .is_some_and(|pins| pins.get(PinAttribute::Diag).is_some());
    match session.settings.driver {
        Some(driver) if driver.supports_stallguard() && has_diag => {
            match driver_profile(session, stepper) {
                DriverProfile::Tmc { .. } => HomingSource::Sensorless(driver),
                _ => HomingSource::Missing,
            }
        }
        _ => HomingSource::Missing,
    }
}

/// How a motor's driver section is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DriverProfile {
    /// No driver configured, or a standalone one
    Basic,
    /// Smart driver reachable over its bus pin
    Tmc {
        /// Driver model
        driver: DriverType,
        /// Resolved uart or cs pin
        bus_pin: String,
    },
    /// Smart driver configured but the port does not wire its bus pin
    Fallback {
        /// Driver model
        driver: DriverType,
        /// Attribute the port lacks
        missing: PinAttribute,
    },
}

pub(crate) fn driver_profile(session: &Session, motor: LogicalFunction) -> DriverProfile {
    let Some(driver) = session.settings.driver else {
        return DriverProfile::Basic;
    };
    let attribute = match driver.interface() {
        DriverInterface::Standalone => return DriverProfile::Basic,
        DriverInterface::Uart => PinAttribute::Uart,
        DriverInterface::Spi => PinAttribute::Cs,
    };
    match session
        .resolved(motor, SlotRole::Primary)
        .and_then(|pins| pins.get(attribute))
    {
        Some(pin) => DriverProfile::Tmc {
            driver,
            bus_pin: pin.to_string(),
        },
        None => DriverProfile::Fallback {
            driver,
            missing: attribute,
        },
    }
}

/// Checks a session against what a rendered config needs.
pub struct SessionValidator<'a> {
    session: &'a Session,
}

impl<'a> SessionValidator<'a> {
    /// Creates a new session validator.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Validates the session.
    ///
    /// Checks:
    /// - A mainboard is selected and core scalars are set
    /// - Core functions are assigned and every axis can home
    /// - Paired functions (bed heater + thermistor) are complete
    /// - Probe hardware matches the probe type
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.validate_scalars(&mut report);
        self.validate_functions(&mut report);
        self.validate_homing(&mut report);
        self.validate_probe(&mut report);
        self.validate_drivers(&mut report);
        self.validate_toolboard(&mut report);

        for port in self.session.registry().conflicts() {
            report.add_warning(ValidationWarning::new(format!(
                "port {port} is claimed by more than one function"
            )));
        }

        report
    }

    fn validate_scalars(&self, report: &mut ValidationReport) {
        let settings = &self.session.settings;

        if self.session.board(BoardRole::Mainboard).is_none() {
            report.add_error(
                ValidationError::new(
                    ValidationErrorKind::MissingRequiredField,
                    "board",
                    "No mainboard selected",
                )
                .with_suggestion(format!(
                    "Select one with `{APP_BINARY_NAME} select-board mainboard <id>`"
                )),
            );
        }

        let scalars = [
            ("kinematics", settings.kinematics.is_some()),
            ("bed_size_x", settings.bed_size_x.is_some()),
            ("bed_size_y", settings.bed_size_y.is_some()),
        ];
        for (field, present) in scalars {
            if !present {
                report.add_error(ValidationError::new(
                    ValidationErrorKind::MissingRequiredField,
                    field,
                    format!("Printer setting '{field}' is not set"),
                ));
            }
        }

        if settings.mcu_serial.is_none() && self.session.board(BoardRole::Mainboard).is_some() {
            report.add_warning(ValidationWarning::new(
                "mcu.serial is not set; edit the serial line of [mcu] before starting Klipper",
            ));
        }
    }

    fn validate_functions(&self, report: &mut ValidationReport) {
        for function in REQUIRED_FUNCTIONS {
            if !self.session.is_assigned(function) {
                report.add_error(missing_function(function));
            }
        }

        let heater = self.session.is_assigned(LogicalFunction::BedHeater);
        let thermistor = self.session.is_assigned(LogicalFunction::BedThermistor);
        if heater && !thermistor {
            report.add_error(missing_function(LogicalFunction::BedThermistor));
        } else if thermistor && !heater {
            report.add_error(missing_function(LogicalFunction::BedHeater));
        }

        let settings = &self.session.settings;
        if self.session.is_assigned(LogicalFunction::ExtruderThermistor)
            && settings.extruder_sensor_type.is_none()
        {
            report.add_warning(ValidationWarning::new(format!(
                "extruder.sensor_type is not set; using '{DEFAULT_SENSOR_TYPE}'"
            )));
        }
        if thermistor && settings.bed_sensor_type.is_none() {
            report.add_warning(ValidationWarning::new(format!(
                "bed.sensor_type is not set; using '{DEFAULT_SENSOR_TYPE}'"
            )));
        }
    }

    fn validate_homing(&self, report: &mut ValidationReport) {
        for axis in [HomingAxis::X, HomingAxis::Y, HomingAxis::Z] {
            match homing_source(self.session, axis) {
                HomingSource::Missing => {
                    let endstop = LogicalFunction::Endstop(axis);
                    report.add_error(missing_function(endstop).with_suggestion(
                        "Assign an endstop port, or use a stallguard capable driver with a DIAG pin",
                    ));
                }
                HomingSource::Probe if !self.session.is_assigned(LogicalFunction::Probe) => {
                    report.add_error(
                        missing_function(LogicalFunction::Probe)
                            .with_suggestion("z_endstop.source is 'probe' but no probe port is assigned"),
                    );
                }
                _ => {}
            }
        }
    }

    fn validate_probe(&self, report: &mut ValidationReport) {
        let assignment = self.session.assignment(LogicalFunction::Probe, SlotRole::Primary);
        let probe_type = self.session.settings.probe_type;

        match (assignment, probe_type) {
            (Some(assignment), Some(kind)) if kind.needs_servo() => {
                let has_servo = self
                    .session
                    .resolved(LogicalFunction::Probe, SlotRole::Primary)
                    .is_some_and(|pins| pins.get(PinAttribute::Servo).is_some());
                if !has_servo {
                    report.add_error(
                        ValidationError::new(
                            ValidationErrorKind::AttributeUnavailable,
                            "probe",
                            format!("{kind} needs a servo pin, but the port does not wire one"),
                        )
                        .with_port(assignment.port.clone(), PinAttribute::Servo)
                        .with_suggestion("Pick a probe port with a servo pin or change probe.type"),
                    );
                }
            }
            (Some(_), None) => {
                report.add_warning(ValidationWarning::new(format!(
                    "probe.type is not set; rendering a generic [probe] ({})",
                    ProbeKind::Inductive
                )));
            }
            (None, Some(kind)) => {
                report.add_warning(ValidationWarning::new(format!(
                    "probe.type is '{kind}' but no probe port is assigned; probe section skipped"
                )));
            }
            _ => {}
        }
    }

    fn validate_drivers(&self, report: &mut ValidationReport) {
        for assignment in self.session.assignments() {
            if !matches!(
                assignment.function,
                LogicalFunction::Stepper(_) | LogicalFunction::Extruder
            ) || assignment.slot != SlotRole::Primary
            {
                continue;
            }
            if let DriverProfile::Fallback { driver, missing } =
                driver_profile(self.session, assignment.function)
            {
                report.add_warning(ValidationWarning::new(format!(
                    "{}: {driver} needs a {missing} pin but {} has none; using a basic driver profile",
                    assignment.function, assignment.port
                )));
            }
        }
    }

    fn validate_toolboard(&self, report: &mut ValidationReport) {
        if self.session.board(BoardRole::Toolboard).is_none() {
            return;
        }
        if self.session.settings.toolboard_canbus_uuid.is_none() {
            report.add_warning(ValidationWarning::new(
                "toolboard.canbus_uuid is not set; edit [mcu toolboard] before starting Klipper",
            ));
        }
        let used = self
            .session
            .assignments()
            .any(|a| a.port.role == BoardRole::Toolboard);
        if !used {
            report.add_warning(ValidationWarning::new(
                "A toolboard is selected but no function uses its ports",
            ));
        }
    }
}

/// Sensor type used when none is configured.
pub const DEFAULT_SENSOR_TYPE: &str = "Generic 3950";

fn missing_function(function: LogicalFunction) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::MissingRequiredField,
        function.key(),
        format!("{} ({function}) has no port assigned", function.description()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::services::AssignmentService;

    fn configured_session(catalog: &Catalog) -> Session {
        let service = AssignmentService::new(catalog);
        let mut session = Session::new();
        service
            .select_board(&mut session, BoardRole::Mainboard, Some("btt-octopus-v1.1"))
            .unwrap();
        for (function, port) in [
            ("stepper_x", "MOTOR0"),
            ("stepper_y", "MOTOR1"),
            ("stepper_z", "MOTOR2"),
            ("extruder", "MOTOR3"),
            ("extruder_heater", "HE0"),
            ("extruder_thermistor", "T0"),
            ("endstop_x", "STOP0"),
            ("endstop_y", "STOP1"),
            ("endstop_z", "STOP2"),
        ] {
            service
                .assign(
                    &mut session,
                    function.parse().unwrap(),
                    BoardRole::Mainboard,
                    port,
                    SlotRole::Primary,
                )
                .unwrap();
        }
        session.settings.set("printer.kinematics", "corexy").unwrap();
        session.settings.set("printer.bed_size_x", "300").unwrap();
        session.settings.set("printer.bed_size_y", "300").unwrap();
        session.settings.set("mcu.serial", "/dev/ttyACM0").unwrap();
        session.settings.set("extruder.sensor_type", "ATC Semitec 104GT-2").unwrap();
        session
    }

    #[test]
    fn test_empty_session_lists_board_first() {
        let session = Session::new();
        let report = SessionValidator::new(&session).validate();
        assert!(!report.is_valid());

        let fields = report.missing_fields();
        assert_eq!(fields[0], "board");
        assert!(fields.contains(&"kinematics".to_string()));
        assert!(fields.contains(&"stepper_x".to_string()));
        assert!(fields.contains(&"endstop_z".to_string()));
        assert!(matches!(
            report.to_config_error(),
            Some(ConfigError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_complete_session_is_valid() {
        let catalog = Catalog::load().unwrap();
        let session = configured_session(&catalog);
        let report = SessionValidator::new(&session).validate();
        assert!(report.is_valid(), "{}", report.format_message());
        assert!(report.to_config_error().is_none());
    }

    #[test]
    fn test_sensorless_homing_satisfies_xy() {
        let catalog = Catalog::load().unwrap();
        let mut session = configured_session(&catalog);
        let service = AssignmentService::new(&catalog);
        service.clear(
            &mut session,
            LogicalFunction::Endstop(HomingAxis::X),
            crate::models::SlotSelector::Both,
        );

        let report = SessionValidator::new(&session).validate();
        assert_eq!(report.missing_fields(), vec!["endstop_x".to_string()]);

        session.settings.set("stepper.driver", "tmc2209").unwrap();
        assert_eq!(
            homing_source(&session, HomingAxis::X),
            HomingSource::Sensorless(DriverType::Tmc2209)
        );
        assert!(SessionValidator::new(&session).validate().is_valid());
    }

    #[test]
    fn test_probe_as_z_endstop_requires_probe() {
        let catalog = Catalog::load().unwrap();
        let mut session = configured_session(&catalog);
        session.settings.set("z_endstop.source", "probe").unwrap();

        let report = SessionValidator::new(&session).validate();
        assert_eq!(report.missing_fields(), vec!["probe".to_string()]);
    }

    #[test]
    fn test_bltouch_without_servo_pin() {
        let json = r#"{"version": "1", "boards": [{
            "id": "tiny", "name": "Tiny", "manufacturer": "Test", "role": "mainboard",
            "ports": {"probe": [{"id": "PROBE", "signal": "PC14"}]}
        }]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        let service = AssignmentService::new(&catalog);
        let mut session = Session::new();
        service
            .select_board(&mut session, BoardRole::Mainboard, Some("tiny"))
            .unwrap();
        service
            .assign(
                &mut session,
                LogicalFunction::Probe,
                BoardRole::Mainboard,
                "PROBE",
                SlotRole::Primary,
            )
            .unwrap();
        session.settings.set("probe.type", "bltouch").unwrap();

        let report = SessionValidator::new(&session).validate();
        let error = report
            .errors
            .iter()
            .find(|e| e.kind == ValidationErrorKind::AttributeUnavailable)
            .unwrap();
        assert_eq!(error.attribute, Some(PinAttribute::Servo));
    }

    #[test]
    fn test_driver_fallback_warns() {
        let catalog = Catalog::load().unwrap();
        let mut session = configured_session(&catalog);
        // Every Octopus motor port wires cs.
        session.settings.set("stepper.driver", "tmc2130").unwrap();
        let report = SessionValidator::new(&session).validate();
        assert!(report.is_valid());
        assert!(report.warnings.is_empty(), "{}", report.format_message());

        let service = AssignmentService::new(&catalog);
        service
            .select_board(&mut session, BoardRole::Toolboard, Some("btt-ebb36-v1.2"))
            .unwrap();
        service.clear(&mut session, LogicalFunction::Extruder, crate::models::SlotSelector::Both);
        service
            .assign(
                &mut session,
                LogicalFunction::Extruder,
                BoardRole::Toolboard,
                "MOTOR",
                SlotRole::Primary,
            )
            .unwrap();
        session.settings.set("toolboard.canbus_uuid", "abc123").unwrap();

        let report = SessionValidator::new(&session).validate();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.starts_with("extruder: tmc2130 needs a cs pin"));
    }

    #[test]
    fn test_bed_pair_is_checked() {
        let catalog = Catalog::load().unwrap();
        let mut session = configured_session(&catalog);
        AssignmentService::new(&catalog)
            .assign(
                &mut session,
                LogicalFunction::BedHeater,
                BoardRole::Mainboard,
                "BED",
                SlotRole::Primary,
            )
            .unwrap();

        let report = SessionValidator::new(&session).validate();
        assert_eq!(report.missing_fields(), vec!["bed_thermistor".to_string()]);
    }

    #[test]
    fn test_format_message() {
        let mut report = ValidationReport::new();
        report.add_error(missing_function(LogicalFunction::Extruder));
        report.add_warning(ValidationWarning::new("careful"));
        let message = report.format_message();
        assert!(message.contains("1 validation errors"));
        assert!(message.contains("Missing Required Field"));
        assert!(message.contains("careful"));
    }
}
