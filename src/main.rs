//! klipconf - Klipper printer configuration from board ports
//!
//! Pick a mainboard (and optionally a toolboard), assign its ports to printer
//! functions, and generate `printer.cfg` with fully resolved pin strings.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klipconf::cli::{
    AssignArgs, BoardsArgs, ClearArgs, ClearPortArgs, ConfigArgs, ExitCode, FunctionsArgs,
    GenerateArgs, PinOptionsArgs, SelectBoardArgs, SessionArgs, SetLocationArgs, ValidateArgs,
};

/// Klipper Configurator - hardware port registry and config generator
#[derive(Parser, Debug)]
#[command(name = "klipconf", author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (also honours RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the board catalog
    Boards(BoardsArgs),
    /// List logical printer functions
    Functions(FunctionsArgs),
    /// Create and inspect session files
    Session(SessionArgs),
    /// Select or deselect the board for a role
    SelectBoard(SelectBoardArgs),
    /// Assign a port to a function
    Assign(AssignArgs),
    /// Clear a function's ports
    Clear(ClearArgs),
    /// Free a port, whatever owns it
    ClearPort(ClearPortArgs),
    /// Move a function to the mainboard or toolboard
    SetLocation(SetLocationArgs),
    /// Set invert / pull-up options for a function
    PinOptions(PinOptionsArgs),
    /// Check a session for missing fields
    Validate(ValidateArgs),
    /// Render printer.cfg and toolboard.cfg
    Generate(GenerateArgs),
    /// Show or change application settings
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Commands::Boards(args) => args.execute(),
        Commands::Functions(args) => args.execute(),
        Commands::Session(args) => args.execute(),
        Commands::SelectBoard(args) => args.execute(),
        Commands::Assign(args) => args.execute(),
        Commands::Clear(args) => args.execute(),
        Commands::ClearPort(args) => args.execute(),
        Commands::SetLocation(args) => args.execute(),
        Commands::PinOptions(args) => args.execute(),
        Commands::Validate(args) => args.execute(),
        Commands::Generate(args) => args.execute(),
        Commands::Config(args) => args.execute(),
    };

    match result {
        Ok(()) => std::process::exit(ExitCode::Success.code()),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(err.exit_code().code());
        }
    }
}
