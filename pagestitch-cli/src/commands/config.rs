//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, `config path`, and
//! `config init` commands for viewing and modifying configuration settings
//! from the command line.

use clap::Subcommand;
use console::style;
use pagestitch::config::{config_file_path, ConfigFile, ConfigKey, ConfigKeyError};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., layout.slots_per_page)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., layout.slots_per_page)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,

    /// Create the configuration file with default values if it is missing
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init => run_init(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|e: ConfigKeyError| CliError::Config(e.to_string()))
}

/// Print one value.
fn run_get(key: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let config = ConfigFile::load()?;
    println!("{}", key.get(&config));
    Ok(())
}

/// Validate and store one value, creating the file if needed.
fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let mut config = ConfigFile::load()?;
    let previous = key.get(&config);

    key.set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save()?;

    println!("{} = {} (was {})", key.name(), key.get(&config), previous);
    Ok(())
}

/// Print every key grouped by section, marking values changed from the defaults.
fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let defaults = ConfigFile::default();
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("{}", style(format!("[{}]", section)).bold());
            current_section = section;
        }

        let value = key.get(&config);
        if value == key.get(&defaults) {
            println!("  {} = {}", key.key_name(), value);
        } else {
            println!(
                "  {} = {} {}",
                key.key_name(),
                style(&value).green(),
                style("(changed)").dim()
            );
        }
    }

    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Write a default config file unless one exists.
fn run_init() -> Result<(), CliError> {
    let path = config_file_path();
    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}
