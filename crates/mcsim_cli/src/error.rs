//! CLI error types.

use mcsim_core::SimulationError;
use thiserror::Error;

/// Failures of a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    /// An environment variable held an unusable value.
    #[error("Environment variable {name} has invalid value '{value}'")]
    InvalidEnv {
        /// Variable name
        name: String,
        /// Offending value
        value: String,
    },

    /// A command-line argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The calculation itself failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// The report could not be serialised.
    #[error("Report serialisation failed: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
