//! Shared CLI plumbing: error type, exit codes, and the session/catalog
//! options most commands flatten in.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::constants::DEFAULT_SESSION_FILE;
use crate::error::ConfigError;
use crate::models::Session;
use crate::parser;
use crate::services::{AssignmentService, RestoreIssue};

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Invalid input, rejected operation, or failed validation
    ValidationError = 1,
    /// File system or parse failure
    IoError = 2,
}

impl ExitCode {
    /// Numeric code passed to `std::process::exit`.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error raised by a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    message: String,
    exit_code: ExitCode,
}

impl CliError {
    /// File system or parse failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::IoError,
        }
    }

    /// Invalid input or rejected operation.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::ValidationError,
        }
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::validation(error.to_string())
    }
}

/// Options for locating the application config and board catalog.
#[derive(Debug, Clone, Default, Args)]
pub struct CatalogOpts {
    /// Application config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra board catalog JSON merged over the built-in boards
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

impl CatalogOpts {
    /// Loads the application config from `--config` or the default location.
    pub fn load_config(&self) -> CliResult<Config> {
        let loaded = match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };
        loaded.map_err(|e| CliError::io(format!("Failed to load configuration: {e:#}")))
    }

    /// Loads the built-in catalog plus `--catalog` (or the configured one).
    pub fn load_catalog(&self, config: &Config) -> CliResult<Catalog> {
        let extra = self.catalog.as_deref().or(config.paths.catalog.as_deref());
        Catalog::load_with(extra)
            .map_err(|e| CliError::io(format!("Failed to load board catalog: {e:#}")))
    }
}

/// Options shared by every command that reads or edits a session file.
#[derive(Debug, Clone, Args)]
pub struct SessionOpts {
    /// Session file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_SESSION_FILE)]
    pub session: PathBuf,

    #[command(flatten)]
    pub catalog: CatalogOpts,
}

/// A session opened from disk together with the catalog it was restored
/// against.
pub struct OpenSession {
    /// Board catalog
    pub catalog: Catalog,
    /// Application config
    pub config: Config,
    /// Restored session
    pub session: Session,
    path: PathBuf,
    skipped: Vec<RestoreIssue>,
}

impl SessionOpts {
    /// Loads config, catalog and session. A missing session file yields an
    /// empty session so the first edit creates it.
    pub fn open(&self) -> CliResult<OpenSession> {
        let config = self.catalog.load_config()?;
        let catalog = self.catalog.load_catalog(&config)?;
        let (session, skipped) = if self.session.exists() {
            restore_session(&catalog, &self.session)?
        } else {
            (Session::new(), Vec::new())
        };
        Ok(OpenSession {
            catalog,
            config,
            session,
            path: self.session.clone(),
            skipped,
        })
    }

    /// Like [`open`](Self::open), but the session file must exist.
    pub fn open_existing(&self) -> CliResult<OpenSession> {
        if !self.session.exists() {
            return Err(CliError::io(format!(
                "Session file not found: {}",
                self.session.display()
            )));
        }
        self.open()
    }
}

impl OpenSession {
    /// Writes the session back to its file.
    ///
    /// Refuses when entries were skipped on load: writing would drop them
    /// from the file for good.
    pub fn save(&self) -> CliResult<()> {
        if !self.skipped.is_empty() {
            let entries: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
            return Err(CliError::validation(format!(
                "Not saving {}: {} entr{} could not be restored ({}). \
                 Pass the catalog that defines them with --catalog, or fix the file by hand",
                self.path.display(),
                entries.len(),
                if entries.len() == 1 { "y" } else { "ies" },
                entries.join("; ")
            )));
        }
        save_session(&self.session, &self.path)
    }

    /// Session file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn restore_session(catalog: &Catalog, path: &Path) -> CliResult<(Session, Vec<RestoreIssue>)> {
    let document = parser::load_session(path).map_err(|e| CliError::io(format!("{e:#}")))?;
    let (session, issues) = AssignmentService::new(catalog).restore(&document);
    for issue in &issues {
        eprintln!("Warning: skipped {issue}");
    }
    Ok((session, issues))
}

/// Saves a session to `path`.
pub fn save_session(session: &Session, path: &Path) -> CliResult<()> {
    parser::save_session(&session.to_document(), path)
        .map_err(|e| CliError::io(format!("Failed to save session: {e:#}")))
}

/// Prints a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{text}");
    Ok(())
}
