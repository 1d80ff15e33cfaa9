//! Validation command for session files.

use crate::cli::common::{print_json, CliError, CliResult, SessionOpts};
use crate::firmware::validator::{SessionValidator, ValidationErrorKind};
use clap::Args;
use serde::Serialize;

/// Check whether a session is complete enough for a strict render
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat warnings as errors (exit non-zero)
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub opts: SessionOpts,
}

#[derive(Debug, Serialize)]
struct ValidationMessage {
    severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidationResponse {
    valid: bool,
    missing_fields: Vec<String>,
    issues: Vec<ValidationMessage>,
}

const fn kind_key(kind: ValidationErrorKind) -> &'static str {
    match kind {
        ValidationErrorKind::MissingRequiredField => "missing_required_field",
        ValidationErrorKind::AttributeUnavailable => "attribute_unavailable",
    }
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> CliResult<()> {
        let open = self.opts.open_existing()?;
        let report = SessionValidator::new(&open.session).validate();

        let mut issues: Vec<ValidationMessage> = report
            .errors
            .iter()
            .map(|e| ValidationMessage {
                severity: "error",
                kind: Some(kind_key(e.kind)),
                field: Some(e.field.clone()),
                port: e.port.as_ref().map(ToString::to_string),
                message: e.message.clone(),
                suggestion: e.suggestion.clone(),
            })
            .collect();
        issues.extend(report.warnings.iter().map(|w| ValidationMessage {
            severity: "warning",
            kind: None,
            field: None,
            port: None,
            message: w.message.clone(),
            suggestion: None,
        }));

        let response = ValidationResponse {
            valid: report.is_valid(),
            missing_fields: report.missing_fields(),
            issues,
        };

        if self.json {
            print_json(&response)?;
        } else if response.valid && report.warnings.is_empty() {
            println!("✓ Validation passed");
        } else {
            if response.valid {
                println!("✓ Validation passed with warnings");
            } else {
                println!("✗ Validation failed");
            }
            println!();
            print!("{}", report.format_message());
        }

        if !response.valid {
            return Err(CliError::validation("Validation failed"));
        }
        if self.strict && !report.warnings.is_empty() {
            return Err(CliError::validation("Warnings found in strict mode"));
        }
        Ok(())
    }
}
