//! Session file persistence.
//!
//! Sessions are stored as flat `key=value` lines:
//!
//! ```text
//! # klipconf session
//! board.mainboard=btt-octopus-v1.1
//! board.toolboard=btt-ebb36-v1.2
//! stepper_x.port=mainboard:MOTOR0
//! fan_hotend.port=toolboard:FAN1
//! fan_hotend.port_2=mainboard:FAN2
//! endstop_x.invert=true
//! printer.kinematics=corexy
//! ```
//!
//! Only facts are stored. Resolved pins are re-derived when the document is
//! restored through the assignment service.

// Allow format! appended to String - more readable for building file text
#![allow(clippy::format_push_string)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{
    AssignmentRecord, BoardRole, LogicalFunction, PinOptions, PortRef, SessionDocument, SlotRole,
};

/// Parses session file text.
///
/// Unknown keys are skipped with a warning so files written by newer
/// versions still load. A malformed value for a known key is an error.
pub fn parse_session(content: &str) -> Result<SessionDocument> {
    let mut document = SessionDocument::default();
    let mut assignments: BTreeMap<(LogicalFunction, SlotRole), AssignmentRecord> = BTreeMap::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("Line {line_number}: expected 'key=value', got '{line}'"))?;
        let key = key.trim();
        let value = unquote(value.trim());

        parse_entry(&mut document, &mut assignments, key, value)
            .with_context(|| format!("Line {line_number}: invalid value for '{key}'"))?;
    }

    document.assignments = assignments.into_values().collect();
    document.pin_options.retain(|_, options| !options.is_default());
    Ok(document)
}

fn parse_entry(
    document: &mut SessionDocument,
    assignments: &mut BTreeMap<(LogicalFunction, SlotRole), AssignmentRecord>,
    key: &str,
    value: &str,
) -> Result<()> {
    match key {
        "board.mainboard" => {
            document.mainboard = non_empty(value);
            return Ok(());
        }
        "board.toolboard" => {
            document.toolboard = non_empty(value);
            return Ok(());
        }
        _ => {}
    }

    if document.settings.set(key, value)? {
        return Ok(());
    }

    let Some((function_key, field)) = key.rsplit_once('.') else {
        tracing::warn!(key, "ignoring unknown session key");
        return Ok(());
    };
    let Ok(function) = function_key.parse::<LogicalFunction>() else {
        tracing::warn!(key, "ignoring unknown session key");
        return Ok(());
    };

    match field {
        "port" | "port_2" => {
            let slot = if field == "port" {
                SlotRole::Primary
            } else {
                SlotRole::Secondary
            };
            if value.is_empty() {
                assignments.remove(&(function, slot));
                return Ok(());
            }
            let port: PortRef = value.parse()?;
            assignments.insert(
                (function, slot),
                AssignmentRecord {
                    function,
                    slot,
                    role: port.role,
                    port: port.port_id,
                },
            );
        }
        "location" => {
            let role: BoardRole = value.parse()?;
            document.locations.insert(function, role);
        }
        "invert" => {
            let invert = parse_bool(value)?;
            document.pin_options.entry(function).or_default().invert = invert;
        }
        "pullup" => {
            let pullup = parse_bool(value)?;
            document.pin_options.entry(function).or_default().suppress_pullup = !pullup;
        }
        _ => tracing::warn!(key, "ignoring unknown session key"),
    }
    Ok(())
}

/// Serializes a document to session file text.
///
/// Output is stable: the same document always produces the same text.
#[must_use]
pub fn serialize_session(document: &SessionDocument) -> String {
    let mut out = String::from("# klipconf session\n");

    out.push_str("\n# Boards\n");
    if let Some(id) = &document.mainboard {
        out.push_str(&format!("board.mainboard={id}\n"));
    }
    if let Some(id) = &document.toolboard {
        out.push_str(&format!("board.toolboard={id}\n"));
    }

    if !document.assignments.is_empty() {
        out.push_str("\n# Ports\n");
        let mut records: Vec<&AssignmentRecord> = document.assignments.iter().collect();
        records.sort_by_key(|r| (r.function, r.slot));
        for record in records {
            let field = match record.slot {
                SlotRole::Primary => "port",
                SlotRole::Secondary => "port_2",
            };
            out.push_str(&format!(
                "{}.{field}={}:{}\n",
                record.function, record.role, record.port
            ));
        }
    }

    let has_pin_options = document.pin_options.values().any(|o| !o.is_default());
    if !document.locations.is_empty() || has_pin_options {
        out.push_str("\n# Function options\n");
        for (function, role) in &document.locations {
            out.push_str(&format!("{function}.location={role}\n"));
        }
        for (function, options) in &document.pin_options {
            write_pin_options(&mut out, *function, *options);
        }
    }

    let settings = document.settings.entries();
    if !settings.is_empty() {
        out.push_str("\n# Settings\n");
        for (key, value) in settings {
            out.push_str(&format!("{key}={value}\n"));
        }
    }

    out
}

fn write_pin_options(out: &mut String, function: LogicalFunction, options: PinOptions) {
    if options.invert {
        out.push_str(&format!("{function}.invert=true\n"));
    }
    if options.suppress_pullup {
        out.push_str(&format!("{function}.pullup=false\n"));
    }
}

/// Loads a session file.
pub fn load_session(path: &Path) -> Result<SessionDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    parse_session(&content)
        .with_context(|| format!("Failed to parse session file: {}", path.display()))
}

/// Saves a session file using an atomic write (temp file + rename).
pub fn save_session(document: &SessionDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = serialize_session(document);
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temporary file: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename to: {}", path.display()))?;

    Ok(())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => anyhow::bail!("Expected true or false, got '{other}'"),
    }
}
