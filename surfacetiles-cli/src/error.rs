//! CLI error type.

use std::fmt;

use surfacetiles::config::ConfigError;
use surfacetiles::tiling::TilingError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, edited or saved.
    Config(String),
    /// A command line argument was out of range.
    InvalidArgument(String),
    /// The tiling registry could not be created.
    Tiling(TilingError),
    /// A tile image could not be written.
    Output(String),
    Io(std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Tiling(e) => write!(f, "Tiling error: {}", e),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<TilingError> for CliError {
    fn from(e: TilingError) -> Self {
        CliError::Tiling(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
