//! Per-function options: home location and pin modifiers.

use crate::cli::common::{CliError, CliResult, SessionOpts};
use crate::models::{BoardRole, LogicalFunction, PinOptions};
use crate::services::AssignmentService;
use clap::Args;

/// Move a function to the mainboard or the toolboard
#[derive(Debug, Clone, Args)]
pub struct SetLocationArgs {
    /// Function key
    #[arg(value_name = "FUNCTION")]
    pub function: LogicalFunction,

    /// Board role (mainboard or toolboard)
    #[arg(value_name = "ROLE")]
    pub role: BoardRole,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Set pin modifiers for a function
#[derive(Debug, Clone, Args)]
pub struct PinOptionsArgs {
    /// Function key
    #[arg(value_name = "FUNCTION")]
    pub function: LogicalFunction,

    /// Invert the line (normally-closed switches, active-low outputs)
    #[arg(long, value_name = "BOOL")]
    pub invert: Option<bool>,

    /// Enable the input pull-up (endstops and probes default to true)
    #[arg(long, value_name = "BOOL")]
    pub pullup: Option<bool>,

    #[command(flatten)]
    pub opts: SessionOpts,
}

impl SetLocationArgs {
    /// Execute the set-location command
    pub fn execute(&self) -> CliResult<()> {
        let mut open = self.opts.open()?;
        let cleared = AssignmentService::new(&open.catalog).set_board_role(
            &mut open.session,
            self.function,
            self.role,
        );
        open.save()?;

        println!("{} now lives on the {}", self.function, self.role);
        if cleared > 0 {
            println!("Cleared {cleared} port(s) assigned on the previous board");
        }
        Ok(())
    }
}

impl PinOptionsArgs {
    /// Execute the pin-options command
    pub fn execute(&self) -> CliResult<()> {
        if self.invert.is_none() && self.pullup.is_none() {
            return Err(CliError::validation(
                "At least one option must be specified: --invert or --pullup",
            ));
        }

        let mut open = self.opts.open()?;
        let mut options: PinOptions = open.session.pin_options(self.function);
        if let Some(invert) = self.invert {
            options.invert = invert;
        }
        if let Some(pullup) = self.pullup {
            options.suppress_pullup = !pullup;
        }

        AssignmentService::new(&open.catalog).set_pin_options(
            &mut open.session,
            self.function,
            options,
        )?;
        open.save()?;

        println!(
            "{}: invert={} pullup={}",
            self.function, options.invert, !options.suppress_pullup
        );
        Ok(())
    }
}
