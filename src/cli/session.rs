//! Session file commands: create, inspect, and edit scalar settings.

use crate::cli::common::{print_json, save_session, CliError, CliResult, SessionOpts};
use crate::models::{BoardRole, PortCategory, Session, SETTING_KEYS};
use crate::services::AssignmentService;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;

/// Create and inspect session files
#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum SessionCommand {
    /// Create a new session file
    Init(InitSessionArgs),
    /// Show boards, assignments, resolved pins and settings
    Show(ShowSessionArgs),
    /// Set a scalar setting (e.g. printer.kinematics corexy)
    Set(SetSettingArgs),
    /// Reset a scalar setting to its default
    Unset(UnsetSettingArgs),
}

/// Create a new session file
#[derive(Debug, Clone, Args)]
pub struct InitSessionArgs {
    /// Mainboard id to select
    #[arg(long, value_name = "BOARD")]
    pub mainboard: Option<String>,

    /// Toolboard id to select
    #[arg(long, value_name = "BOARD")]
    pub toolboard: Option<String>,

    /// Overwrite an existing session file
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Show a session
#[derive(Debug, Clone, Args)]
pub struct ShowSessionArgs {
    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Set a scalar setting
#[derive(Debug, Clone, Args)]
pub struct SetSettingArgs {
    /// Setting key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// New value
    #[arg(value_name = "VALUE")]
    pub value: String,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Reset a scalar setting
#[derive(Debug, Clone, Args)]
pub struct UnsetSettingArgs {
    /// Setting key
    #[arg(value_name = "KEY")]
    pub key: String,

    #[command(flatten)]
    pub opts: SessionOpts,
}

/// Select or deselect the board for a role
#[derive(Debug, Clone, Args)]
pub struct SelectBoardArgs {
    /// Board role (mainboard or toolboard)
    #[arg(value_name = "ROLE")]
    pub role: BoardRole,

    /// Board id; omit together with --none to deselect
    #[arg(value_name = "BOARD", required_unless_present = "none")]
    pub board: Option<String>,

    /// Deselect the role's board
    #[arg(long, conflicts_with = "board")]
    pub none: bool,

    #[command(flatten)]
    pub opts: SessionOpts,
}

#[derive(Debug, Serialize)]
struct AssignmentView {
    function: String,
    slot: String,
    port: String,
    pins: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct SessionView {
    mainboard: Option<String>,
    toolboard: Option<String>,
    assignments: Vec<AssignmentView>,
    used_ports: BTreeMap<String, Vec<String>>,
    locations: BTreeMap<String, String>,
    settings: BTreeMap<String, String>,
}

impl SessionView {
    fn build(session: &Session) -> Self {
        let registry = session.registry();
        let assignments = registry
            .all_assignments()
            .into_iter()
            .map(|a| AssignmentView {
                function: a.function.to_string(),
                slot: a.slot.to_string(),
                port: a.port.to_string(),
                pins: session
                    .resolved(a.function, a.slot)
                    .map(|pins| {
                        pins.iter()
                            .map(|(attr, pin)| (attr.to_string(), pin.to_string()))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();
        let used_ports = PortCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let used = registry.used_by_category(category);
                (!used.is_empty()).then(|| {
                    (
                        category.to_string(),
                        used.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    )
                })
            })
            .collect();
        let document = session.to_document();
        Self {
            mainboard: document.mainboard,
            toolboard: document.toolboard,
            assignments,
            used_ports,
            locations: document
                .locations
                .iter()
                .map(|(f, r)| (f.to_string(), r.to_string()))
                .collect(),
            settings: session
                .settings
                .entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl SessionArgs {
    /// Execute the session command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            SessionCommand::Init(args) => args.execute(),
            SessionCommand::Show(args) => args.execute(),
            SessionCommand::Set(args) => args.execute(),
            SessionCommand::Unset(args) => args.execute(),
        }
    }
}

impl InitSessionArgs {
    /// Execute the init command
    pub fn execute(&self) -> CliResult<()> {
        let path = &self.opts.session;
        if path.exists() && !self.force {
            return Err(CliError::validation(format!(
                "Session file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }

        let config = self.opts.catalog.load_config()?;
        let catalog = self.opts.catalog.load_catalog(&config)?;
        let service = AssignmentService::new(&catalog);

        let mut session = Session::new();
        service.select_board(&mut session, BoardRole::Mainboard, self.mainboard.as_deref())?;
        service.select_board(&mut session, BoardRole::Toolboard, self.toolboard.as_deref())?;
        save_session(&session, path)?;

        println!("Created session {}", path.display());
        Ok(())
    }
}

impl ShowSessionArgs {
    /// Execute the show command
    pub fn execute(&self) -> CliResult<()> {
        let open = self.opts.open_existing()?;
        let view = SessionView::build(&open.session);

        if self.json {
            return print_json(&view);
        }

        println!("Session: {}", open.path().display());
        for role in BoardRole::ALL {
            println!(
                "  {:<10} {}",
                role.as_str(),
                open.session.board(role).unwrap_or("(none)")
            );
        }

        println!();
        if view.assignments.is_empty() {
            println!("No ports assigned.");
        } else {
            println!("Assignments ({}):", view.assignments.len());
            for a in &view.assignments {
                let pins: Vec<String> = a.pins.iter().map(|(k, v)| format!("{k}={v}")).collect();
                println!(
                    "  {:<22} {:<9} {:<18} {}",
                    a.function,
                    a.slot,
                    a.port,
                    pins.join(" ")
                );
            }
        }

        println!();
        println!("Settings:");
        for key in SETTING_KEYS {
            let value = open.session.settings.get(key);
            println!("  {key:<24} {}", value.as_deref().unwrap_or("-"));
        }
        Ok(())
    }
}

impl SetSettingArgs {
    /// Execute the set command
    pub fn execute(&self) -> CliResult<()> {
        let mut open = self.opts.open()?;
        let known = open
            .session
            .settings
            .set(&self.key, &self.value)
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        if !known {
            return Err(CliError::validation(format!(
                "Unknown setting '{}'. Expected one of: {}",
                self.key,
                SETTING_KEYS.join(", ")
            )));
        }
        open.save()?;
        println!("{} = {}", self.key, self.value.trim());
        Ok(())
    }
}

impl UnsetSettingArgs {
    /// Execute the unset command
    pub fn execute(&self) -> CliResult<()> {
        let mut open = self.opts.open_existing()?;
        if !open.session.settings.unset(&self.key) {
            return Err(CliError::validation(format!(
                "Unknown setting '{}'",
                self.key
            )));
        }
        open.save()?;
        println!("Reset {}", self.key);
        Ok(())
    }
}

impl SelectBoardArgs {
    /// Execute the select-board command
    pub fn execute(&self) -> CliResult<()> {
        let mut open = self.opts.open()?;
        let board = if self.none { None } else { self.board.as_deref() };

        let cleared = AssignmentService::new(&open.catalog).select_board(
            &mut open.session,
            self.role,
            board,
        )?;
        open.save()?;

        match board {
            Some(id) => println!("Selected {} {id}", self.role),
            None => println!("Deselected {}", self.role),
        }
        if cleared > 0 {
            println!("Cleared {cleared} assignment(s) on the previous {}", self.role);
        }
        Ok(())
    }
}
