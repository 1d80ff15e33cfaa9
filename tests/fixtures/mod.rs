//! Shared test fixtures for E2E CLI and web tests.
#![allow(dead_code)] // Not every test file uses every fixture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Small catalog with the pin values used throughout the scenario tests.
pub const TEST_CATALOG_JSON: &str = r#"{
  "version": "1",
  "boards": [
    {
      "id": "test-main",
      "name": "Test Mainboard",
      "manufacturer": "Test",
      "role": "mainboard",
      "mcu": "stm32f446",
      "ports": {
        "motor": [
          { "id": "MOTOR0", "step": "PF13", "dir": "PF12", "enable": "PF14", "uart": "PC4", "diag": "PG6" },
          { "id": "MOTOR1", "step": "PG0", "dir": "PG1", "enable": "PF15", "uart": "PD11", "diag": "PG9" },
          { "id": "MOTOR2", "step": "PF11", "dir": "PG3", "enable": "PG5", "uart": "PC6" },
          { "id": "MOTOR3", "step": "PG4", "dir": "PC1", "enable": "PA0" }
        ],
        "heater": [
          { "id": "HE0", "pin": "PA2" },
          { "id": "BED", "pin": "PA1" }
        ],
        "thermistor": [
          { "id": "T0", "pin": "PF4" },
          { "id": "TB", "pin": "PF3" }
        ],
        "fan": [
          { "id": "FAN0", "pin": "PA8" },
          { "id": "FAN2", "pin": "PB1" }
        ],
        "endstop": [
          { "id": "STOP0", "pin": "PG6" },
          { "id": "STOP1", "pin": "PG9" },
          { "id": "STOP2", "pin": "PG10" }
        ],
        "probe": [
          { "id": "PROBE", "signal": "PG15" }
        ]
      }
    },
    {
      "id": "test-tool",
      "name": "Test Toolboard",
      "manufacturer": "Test",
      "role": "toolboard",
      "mcu": "stm32g0b1",
      "ports": {
        "motor": [
          { "id": "MOTOR", "step": "PD0", "dir": "PD1", "enable": "PD2" }
        ],
        "heater": [ { "id": "HE0", "pin": "PB13" } ],
        "thermistor": [ { "id": "TH0", "pin": "PA3" } ],
        "fan": [ { "id": "FAN1", "pin": "PA8" } ],
        "probe": [ { "id": "PROBE", "signal": "PB8" } ]
      }
    }
  ]
}"#;

/// Path to the klipconf binary
pub fn klipconf_bin() -> &'static str {
    env!("CARGO_BIN_EXE_klipconf")
}

/// Temporary workspace: isolated config directory, a session file path and
/// the test catalog written to disk.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    /// Creates a workspace with the test catalog written to `boards.json`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("boards.json"), TEST_CATALOG_JSON)
            .expect("Failed to write test catalog");
        fs::create_dir_all(dir.path().join("config")).expect("Failed to create config dir");
        Self { dir }
    }

    /// Workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Session file used by [`run`](Self::run).
    pub fn session_path(&self) -> PathBuf {
        self.dir.path().join("printer.session")
    }

    /// Test catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.dir.path().join("boards.json")
    }

    /// Directory for generated files.
    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Runs klipconf with an isolated config directory and no extra flags.
    pub fn run_raw(&self, args: &[&str]) -> Output {
        Command::new(klipconf_bin())
            .env("KLIPCONF_CONFIG_DIR", self.dir.path().join("config"))
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute command")
    }

    /// Runs a session command with `--session` and `--catalog` appended.
    pub fn run(&self, args: &[&str]) -> Output {
        let session = self.session_path();
        let catalog = self.catalog_path();
        let mut full: Vec<&str> = args.to_vec();
        full.extend([
            "--session",
            session.to_str().expect("utf-8 temp path"),
            "--catalog",
            catalog.to_str().expect("utf-8 temp path"),
        ]);
        self.run_raw(&full)
    }

    /// Runs a session command and asserts it exited with 0.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_eq!(
            output.status.code(),
            Some(0),
            "`klipconf {}` should succeed. stdout: {} stderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Reads the session file.
    pub fn session_text(&self) -> String {
        fs::read_to_string(self.session_path()).expect("Failed to read session file")
    }

    /// Creates a session with the test mainboard selected.
    pub fn with_mainboard() -> Self {
        let env = Self::new();
        env.run_ok(&["session", "init", "--mainboard", "test-main"]);
        env
    }

    /// Creates a session with both test boards selected.
    pub fn with_both_boards() -> Self {
        let env = Self::new();
        env.run_ok(&[
            "session",
            "init",
            "--mainboard",
            "test-main",
            "--toolboard",
            "test-tool",
        ]);
        env
    }

    /// Fills in everything a strict render needs on the test mainboard.
    pub fn complete_printer(&self) {
        for (function, port) in [
            ("stepper_x", "MOTOR0"),
            ("stepper_y", "MOTOR1"),
            ("stepper_z", "MOTOR2"),
            ("extruder", "MOTOR3"),
            ("extruder_heater", "HE0"),
            ("extruder_thermistor", "T0"),
            ("bed_heater", "BED"),
            ("bed_thermistor", "TB"),
            ("endstop_x", "STOP0"),
            ("endstop_y", "STOP1"),
            ("endstop_z", "STOP2"),
        ] {
            self.run_ok(&["assign", function, port]);
        }
        for (key, value) in [
            ("printer.kinematics", "corexy"),
            ("printer.bed_size_x", "300"),
            ("printer.bed_size_y", "300"),
            ("extruder.sensor_type", "Generic 3950"),
            ("bed.sensor_type", "Generic 3950"),
            ("mcu.serial", "/dev/serial/by-id/usb-Klipper_test"),
        ] {
            self.run_ok(&["session", "set", key, value]);
        }
    }
}

/// Parses stdout as JSON.
pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}
