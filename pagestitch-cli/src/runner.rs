//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading and logging initialization so command handlers
//! start from the same state.

use crate::error::CliError;
use console::Term;
use pagestitch::config::ConfigFile;
use pagestitch::logging::{init_logging, LoggingGuard, LoggingOptions};
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner with optional debug logging.
    ///
    /// When stderr is a terminal, console logging is disabled so log lines do
    /// not break the progress line.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let options = LoggingOptions {
            file: config.logging.file.clone(),
            console: !Term::stderr().is_term(),
            debug: debug_mode,
        };
        let logging_guard =
            init_logging(&options).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("pagestitch v{}", pagestitch::VERSION);
        info!(log_file = %self.config.logging.file.display(), "pagestitch CLI: {} command", command);
    }
}
