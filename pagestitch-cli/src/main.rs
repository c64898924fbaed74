//! pagestitch CLI - Command-line interface
//!
//! This binary provides a command-line interface to the pagestitch library.

mod commands;
mod error;
mod progress;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::stitch::StitchArgs;

#[derive(Parser)]
#[command(name = "pagestitch")]
#[command(version = pagestitch::VERSION)]
#[command(about = "Rebuild paged documents from tiled image viewers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover tiles, assemble pages and save them as one PDF
    Stitch(StitchArgs),

    /// View or modify ~/.pagestitch/config.ini
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stitch(args) => commands::stitch::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
