//! Board catalog browsing commands.

use crate::catalog::BoardCatalog;
use crate::cli::common::{print_json, CatalogOpts, CliError, CliResult};
use crate::models::{Board, BoardRole, PortCategory};
use clap::{Args, Subcommand};
use serde::Serialize;

/// Browse the board catalog
#[derive(Debug, Clone, Args)]
pub struct BoardsArgs {
    /// Boards subcommand
    #[command(subcommand)]
    pub command: BoardsCommand,
}

/// Board catalog subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum BoardsCommand {
    /// List known boards
    List(ListBoardsArgs),
    /// Show one board and its ports
    Show(ShowBoardArgs),
}

/// List known boards
#[derive(Debug, Clone, Args)]
pub struct ListBoardsArgs {
    /// Only boards designed for this role (mainboard or toolboard)
    #[arg(long, value_name = "ROLE")]
    pub role: Option<BoardRole>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub catalog: CatalogOpts,
}

/// Show one board and its ports
#[derive(Debug, Clone, Args)]
pub struct ShowBoardArgs {
    /// Board id (see `boards list`)
    #[arg(value_name = "BOARD")]
    pub board: String,

    /// Only ports of this category
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<PortCategory>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub catalog: CatalogOpts,
}

#[derive(Debug, Serialize)]
struct BoardSummary<'a> {
    id: &'a str,
    name: &'a str,
    manufacturer: &'a str,
    role: BoardRole,
    mcu: &'a str,
    ports: usize,
}

impl<'a> From<&'a Board> for BoardSummary<'a> {
    fn from(board: &'a Board) -> Self {
        Self {
            id: &board.id,
            name: &board.name,
            manufacturer: &board.manufacturer,
            role: board.role,
            mcu: &board.mcu,
            ports: board.ports.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ListBoardsResponse<'a> {
    boards: Vec<BoardSummary<'a>>,
    count: usize,
}

impl BoardsArgs {
    /// Execute the boards command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            BoardsCommand::List(args) => args.execute(),
            BoardsCommand::Show(args) => args.execute(),
        }
    }
}

impl ListBoardsArgs {
    /// Execute the list command
    pub fn execute(&self) -> CliResult<()> {
        let config = self.catalog.load_config()?;
        let catalog = self.catalog.load_catalog(&config)?;

        let boards: Vec<BoardSummary> = match self.role {
            Some(role) => catalog.boards_for_role(role),
            None => catalog.boards(),
        }
        .into_iter()
        .map(BoardSummary::from)
        .collect();

        let response = ListBoardsResponse {
            count: boards.len(),
            boards,
        };

        if self.json {
            return print_json(&response);
        }

        if response.count == 0 {
            println!("No boards found.");
            return Ok(());
        }
        println!("Boards ({}):", response.count);
        println!();
        for board in &response.boards {
            println!(
                "  {:<22} {:<10} {:<28} {}",
                board.id,
                board.role.as_str(),
                board.name,
                board.mcu
            );
        }
        Ok(())
    }
}

impl ShowBoardArgs {
    /// Execute the show command
    pub fn execute(&self) -> CliResult<()> {
        let config = self.catalog.load_config()?;
        let catalog = self.catalog.load_catalog(&config)?;
        let board = catalog.get_board(&self.board)?;

        if self.json {
            let mut shown = board.clone();
            if let Some(category) = self.category {
                shown.ports.retain(|p| p.category == category);
            }
            return print_json(&shown);
        }

        println!("{} ({})", board.name, board.id);
        println!("  Manufacturer: {}", board.manufacturer);
        println!("  Role:         {}", board.role);
        println!("  MCU:          {}", board.mcu);

        let categories: Vec<PortCategory> = match self.category {
            Some(category) => vec![category],
            None => board.categories(),
        };
        for category in categories {
            println!();
            println!("  {category} ports:");
            let mut any = false;
            for port in board.ports_in(category) {
                any = true;
                let pins: Vec<String> = port
                    .pins
                    .attributes()
                    .into_iter()
                    .filter_map(|attr| port.pins.raw(attr).map(|raw| format!("{attr}={raw}")))
                    .collect();
                let label = port
                    .label
                    .as_deref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default();
                println!("    {:<10}{} {}", port.id, label, pins.join(" "));
            }
            if !any {
                return Err(CliError::validation(format!(
                    "Board '{}' has no {category} ports",
                    board.id
                )));
            }
        }
        Ok(())
    }
}
