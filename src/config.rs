//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::firmware::RenderMode;

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Extra board catalog merged over the built-in one
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Where `generate` writes files when no `--out-dir` is given
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Rendering preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderConfig {
    /// Default render mode
    #[serde(default)]
    pub mode: RenderMode,
}

/// Application configuration.
///
/// Stored in `config.toml` under the platform config directory. Every field
/// has a default, so a missing or partial file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Rendering settings
    #[serde(default)]
    pub render: RenderConfig,
}

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "KLIPCONF_CONFIG_DIR";

/// Keys accepted by [`Config::set`].
pub const CONFIG_KEYS: [&str; 3] = ["paths.catalog", "paths.output_dir", "render.mode"];

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: PathConfig::default(),
            render: RenderConfig::default(),
        }
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/KlipperConfigurator/`
    /// - macOS: `~/Library/Application Support/KlipperConfigurator/`
    /// - Windows: `%APPDATA%\KlipperConfigurator\`
    ///
    /// `KLIPCONF_CONFIG_DIR` overrides the location.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("KlipperConfigurator");

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to the config file using an atomic write.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit path (temp file + rename).
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    ///
    /// Checks:
    /// - The extra catalog file exists (if set)
    /// - `output_dir` is not empty
    pub fn validate(&self) -> Result<()> {
        if let Some(catalog) = &self.paths.catalog {
            if !catalog.is_file() {
                anyhow::bail!("Catalog file not found: {}", catalog.display());
            }
        }
        if self.paths.output_dir.as_os_str().is_empty() {
            anyhow::bail!("paths.output_dir cannot be empty");
        }
        Ok(())
    }

    /// Sets a value by dotted key. An empty value for `paths.catalog`
    /// removes it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let mut updated = self.clone();
        match key {
            "paths.catalog" => {
                updated.paths.catalog = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "paths.output_dir" => updated.paths.output_dir = PathBuf::from(value),
            "render.mode" => updated.render.mode = value.parse()?,
            other => anyhow::bail!(
                "Unknown config key '{other}'. Expected one of: {}",
                CONFIG_KEYS.join(", ")
            ),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Value of a dotted key, for display.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "paths.catalog" => self
                .paths
                .catalog
                .as_ref()
                .map(|p| p.display().to_string()),
            "paths.output_dir" => Some(self.paths.output_dir.display().to_string()),
            "render.mode" => Some(self.render.mode.to_string()),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
