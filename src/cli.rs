//! CLI command implementations for Conquest.

pub(crate) mod combat;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;

mod output;

use clap::ValueEnum;
use conquest::GameConfig;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Output format for the `run` and `combat` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Plain text state dump.
    Text,
    /// Full game state as JSON.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

impl From<conquest::ConfigError> for CliError {
    fn from(e: conquest::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::tournament::TournamentError> for CliError {
    fn from(e: conquest::tournament::TournamentError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::replay::ReplayError> for CliError {
    fn from(e: conquest::replay::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub(crate) fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, or the given file merged over them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub(crate) fn load_config(path: Option<&Path>) -> Result<GameConfig, CliError> {
    match path {
        Some(path) => Ok(GameConfig::load(path)?),
        None => Ok(GameConfig::default()),
    }
}

/// Seed from the clock when none was given.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn seed_or_clock(seed: Option<u32>) -> u32 {
    seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
            .unwrap_or(42)
    })
}
