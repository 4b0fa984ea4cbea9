//! CLI error type.

use std::io;

use bumpath::config::ConfigError;
use bumpath::BumError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Engine failure during scan, rewrite or merge.
    Engine(BumError),

    /// Configuration problem.
    Config(String),

    /// Missing or conflicting command-line input.
    Usage(String),

    /// Loading the hash tables failed.
    HashTables(io::Error),

    /// Some packages in a batch failed.
    BatchFailed { failed: usize, total: usize },

    /// The batch was cancelled before every package ran.
    Cancelled { completed: usize, total: usize },

    /// Writing output failed.
    Output(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{}: {}", e.kind(), e),
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Usage(msg) => write!(f, "{}", msg),
            Self::HashTables(e) => write!(f, "failed to load hash tables: {}", e),
            Self::BatchFailed { failed, total } => {
                write!(f, "{} of {} packages failed", failed, total)
            }
            Self::Cancelled { completed, total } => {
                write!(f, "cancelled after {} of {} packages", completed, total)
            }
            Self::Output(msg) => write!(f, "failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::HashTables(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BumError> for CliError {
    fn from(e: BumError) -> Self {
        Self::Engine(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
