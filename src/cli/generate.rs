//! Generate command for Klipper config files.

use crate::cli::common::{print_json, CliError, CliResult, SessionOpts};
use crate::firmware::{render, RenderMode};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Render printer.cfg (and toolboard.cfg) from a session
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Output directory (defaults to paths.output_dir from the config)
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Render mode: strict or placeholder (defaults to render.mode from the config)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<RenderMode>,

    /// Shorthand for --mode placeholder
    #[arg(long, conflicts_with = "mode")]
    pub placeholder: bool,

    /// Print the files instead of writing them
    #[arg(long)]
    pub stdout: bool,

    /// Print files and warnings as JSON instead of writing them
    #[arg(long, conflicts_with = "stdout")]
    pub json: bool,

    #[command(flatten)]
    pub opts: SessionOpts,
}

#[derive(Debug, Serialize)]
struct GenerateResponse<'a> {
    mode: RenderMode,
    files: &'a BTreeMap<String, String>,
    warnings: &'a [String],
}

impl GenerateArgs {
    /// Execute the generate command
    pub fn execute(&self) -> CliResult<()> {
        let open = self.opts.open_existing()?;
        let mode = if self.placeholder {
            RenderMode::Placeholder
        } else {
            self.mode.unwrap_or(open.config.render.mode)
        };

        let rendered = render(&open.session, mode).map_err(|e| {
            CliError::validation(format!(
                "Cannot render in {mode} mode: {e} (use --placeholder for a draft)"
            ))
        })?;

        if self.json {
            return print_json(&GenerateResponse {
                mode,
                files: rendered.files(),
                warnings: rendered.warnings(),
            });
        }

        for warning in rendered.warnings() {
            eprintln!("Warning: {warning}");
        }

        if self.stdout {
            for (name, text) in rendered.files() {
                println!("# ==> {name} <==");
                print!("{text}");
            }
            return Ok(());
        }

        let out_dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| open.config.paths.output_dir.clone());
        let written = rendered
            .write_to(&out_dir)
            .map_err(|e| CliError::io(format!("{e:#}")))?;

        println!("✓ Config generated ({mode})");
        for path in written {
            println!("  {}", path.display());
        }
        Ok(())
    }
}
