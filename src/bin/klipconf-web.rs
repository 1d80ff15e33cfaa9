//! klipconf Web Server Binary
//!
//! This binary starts the klipconf preview server that renders session
//! documents into Klipper config text for a browser-based configurator.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, built-in board catalog)
//! klipconf-web
//!
//! # Specify port and an extra board catalog
//! klipconf-web --port 8080 --catalog ~/my-boards.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klipconf::catalog::Catalog;
use klipconf::config::Config;
use klipconf::web;

/// klipconf Web Server - REST API for live config previews
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Extra board catalog JSON merged over the built-in boards.
    /// Defaults to `paths.catalog` from the application config.
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Application config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, falling back to defaults
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    let extra = args.catalog.as_deref().or(config.paths.catalog.as_deref());
    let catalog = Catalog::load_with(extra).context("Failed to load board catalog")?;
    info!("Loaded {} boards", catalog.len());

    // Build socket address
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    // Start the server
    web::run_server(catalog, addr).await
}
