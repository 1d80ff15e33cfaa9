//! Configuration management CLI commands.

use crate::cli::common::{print_json, CliError, CliResult};
use crate::config::{Config, CONFIG_KEYS};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Application config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set a configuration value
    Set(ConfigSetArgs),
}

/// Display current configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set a configuration value
#[derive(Args, Debug, Clone)]
pub struct ConfigSetArgs {
    /// Key: paths.catalog, paths.output_dir, or render.mode
    #[arg(value_name = "KEY")]
    key: String,

    /// New value (empty clears paths.catalog)
    #[arg(value_name = "VALUE")]
    value: String,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()
                .map_err(|e| CliError::io(format!("Failed to locate config file: {e}")))?,
        };
        match &self.command {
            ConfigCommand::Show(args) => args.execute(&path),
            ConfigCommand::Set(args) => args.execute(&path),
        }
    }
}

impl ConfigShowArgs {
    fn execute(&self, path: &std::path::Path) -> CliResult<()> {
        let config = Config::load_from(path)
            .map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))?;

        if self.json {
            return print_json(&config);
        }

        println!("Configuration ({})", path.display());
        for key in CONFIG_KEYS {
            println!(
                "  {key:<18} {}",
                config.get(key).unwrap_or_else(|| "(not set)".to_string())
            );
        }
        Ok(())
    }
}

impl ConfigSetArgs {
    fn execute(&self, path: &std::path::Path) -> CliResult<()> {
        let mut config = Config::load_from(path).unwrap_or_default();
        config
            .set(&self.key, &self.value)
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        config
            .save_to(path)
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("✓ {} updated", self.key);
        Ok(())
    }
}
