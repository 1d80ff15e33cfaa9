//! Port assignment commands.

use crate::cli::common::{CliError, CliResult, SessionOpts};
use crate::models::{BoardRole, LogicalFunction, PortRef, SlotRole, SlotSelector};
use crate::services::{AssignOutcome, AssignmentService};
use clap::Args;

/// Assign a board port to a logical function
#[derive(Debug, Clone, Args)]
pub struct AssignArgs {
    /// Function key (see `functions`)
    #[arg(value_name = "FUNCTION")]
    pub function: LogicalFunction,

    /// Port as `role:PORT` (e.g. toolboard:FAN1), or a bare port id with --board
    #[arg(value_name = "PORT")]
    pub port: String,

    /// Board role for a bare port id
    #[arg(long, value_name = "ROLE", default_value = "mainboard")]
    pub board: BoardRole,

    /// Assign as the function's second output (multi-pin fans)
    #[arg(long)]
    pub secondary: bool,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Clear a function's ports
#[derive(Debug, Clone, Args)]
pub struct ClearArgs {
    /// Function key
    #[arg(value_name = "FUNCTION")]
    pub function: LogicalFunction,

    /// Which slots to clear: primary, secondary, or both
    #[arg(long, value_name = "SLOT", default_value = "both")]
    pub slot: SlotSelector,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Free a port, whatever function owns it
#[derive(Debug, Clone, Args)]
pub struct ClearPortArgs {
    /// Port as `role:PORT`
    #[arg(value_name = "PORT")]
    pub port: PortRef,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Parses `role:PORT`, falling back to `default_role` for a bare id.
pub fn parse_port_arg(value: &str, default_role: BoardRole) -> CliResult<PortRef> {
    if value.contains(':') {
        value
            .parse()
            .map_err(|e| CliError::validation(format!("Invalid port '{value}': {e}")))
    } else if value.trim().is_empty() {
        Err(CliError::validation("Port id cannot be empty"))
    } else {
        Ok(PortRef::new(default_role, value.trim()))
    }
}

impl AssignArgs {
    /// Execute the assign command
    pub fn execute(&self) -> CliResult<()> {
        let port = parse_port_arg(&self.port, self.board)?;
        let slot = if self.secondary {
            SlotRole::Secondary
        } else {
            SlotRole::Primary
        };

        let mut open = self.opts.open()?;
        let outcome = AssignmentService::new(&open.catalog).assign(
            &mut open.session,
            self.function,
            port.role,
            &port.port_id,
            slot,
        )?;

        if outcome == AssignOutcome::Unchanged {
            println!("{} ({slot}) already uses {port}", self.function);
            return Ok(());
        }
        open.save()?;

        match &outcome {
            AssignOutcome::Unchanged => {}
            AssignOutcome::Assigned => println!("Assigned {port} to {} ({slot})", self.function),
            AssignOutcome::Reassigned { previous } => println!(
                "Moved {} ({slot}) from {previous} to {port}",
                self.function
            ),
        }
        if let Some(pins) = open.session.resolved(self.function, slot) {
            for (attribute, pin) in pins.iter() {
                println!("  {attribute}: {pin}");
            }
        }
        Ok(())
    }
}

impl ClearArgs {
    /// Execute the clear command
    pub fn execute(&self) -> CliResult<()> {
        let mut open = self.opts.open_existing()?;
        let removed =
            AssignmentService::new(&open.catalog).clear(&mut open.session, self.function, self.slot);
        if removed == 0 {
            println!("{} has no assigned ports", self.function);
            return Ok(());
        }
        open.save()?;
        println!("Cleared {removed} port(s) from {}", self.function);
        Ok(())
    }
}

impl ClearPortArgs {
    /// Execute the clear-port command
    pub fn execute(&self) -> CliResult<()> {
        let mut open = self.opts.open_existing()?;
        let owner = AssignmentService::new(&open.catalog).clear_port(
            &mut open.session,
            self.port.role,
            &self.port.port_id,
        );
        match owner {
            Some((function, slot)) => {
                open.save()?;
                println!("Freed {} (was {function} {slot})", self.port);
            }
            None => println!("{} is not in use", self.port),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_arg() {
        let port = parse_port_arg("toolboard:FAN1", BoardRole::Mainboard).unwrap();
        assert_eq!(port, PortRef::new(BoardRole::Toolboard, "FAN1"));

        let bare = parse_port_arg("MOTOR0", BoardRole::Mainboard).unwrap();
        assert_eq!(bare, PortRef::new(BoardRole::Mainboard, "MOTOR0"));

        assert!(parse_port_arg("nowhere:FAN1", BoardRole::Mainboard).is_err());
        assert!(parse_port_arg("  ", BoardRole::Mainboard).is_err());
    }
}
