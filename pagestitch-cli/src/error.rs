//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use pagestitch::config::ConfigFileError;
use pagestitch::pipeline::PipelineError;
use pagestitch::view::ViewError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to open the tile source
    Source(ViewError),
    /// Failed to prepare the output directory
    OutputDir { path: String, error: std::io::Error },
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// The download run failed
    Pipeline(PipelineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Pipeline(PipelineError::DiscoveryTimeout { .. }) => {
                eprintln!();
                eprintln!("The number of tiles never settled. Try:");
                eprintln!("  1. Raising discovery.max_wait_secs");
                eprintln!("  2. Raising discovery.poll_interval_ms on slow sources");
            }
            CliError::Pipeline(PipelineError::NoCompletePages { .. }) => {
                eprintln!();
                eprintln!("No page had every slot filled. Check that:");
                eprintln!("  1. The source actually contains tile images");
                eprintln!("  2. layout.slots_per_page (or --slots-per-page) matches the viewer");
            }
            CliError::Pipeline(PipelineError::OutputLibraryUnavailable(_)) => {
                eprintln!();
                eprintln!("Check output.page_width, output.page_height and output.unit.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Use 'pagestitch config list' to see available keys and values.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Source(e) => write!(f, "Failed to open tile source: {}", e),
            CliError::OutputDir { path, error } => {
                write!(f, "Failed to create output directory '{}': {}", path, error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Pipeline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Source(e) => Some(e),
            CliError::OutputDir { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<ViewError> for CliError {
    fn from(e: ViewError) -> Self {
        CliError::Source(e)
    }
}
