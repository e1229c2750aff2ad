//! FleetMap CLI - Command-line interface
//!
//! Tracks live vehicle positions from a position feed, keeps marker
//! selections across refreshes and exports each refresh as GeoJSON.

mod commands;
mod error;
mod renderer;
mod runner;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use commands::run::RunArgs;

/// FleetMap - live vehicle positions on a map
#[derive(Debug, Parser)]
#[command(name = "fleetmap")]
#[command(about = "Track live vehicle positions from a position feed", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the configuration file with default settings
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Fetch positions once and print them
    Fetch(FetchArgs),

    /// Track positions continuously with an interactive console
    Run(RunArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Fetch(args) => commands::fetch::run(args),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
