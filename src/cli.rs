//! CLI command implementations for Geoduel.

pub(crate) mod score;
pub(crate) mod simulate;
pub(crate) mod solo;
pub(crate) mod tier;

mod output;

use clap::ValueEnum;
use geoduel::{Coordinate, EngineConfig, MemoryCatalog};
use rand::Rng;
use std::path::Path;
use thiserror::Error;

/// Output format for single-result commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `simulate` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SimulateFormat {
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

impl From<geoduel::EngineError> for CliError {
    fn from(e: geoduel::EngineError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<geoduel::config::ConfigError> for CliError {
    fn from(e: geoduel::config::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

/// Load the configuration file, or the defaults when none is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => EngineConfig::load(path)
            .map_err(|e| CliError::new(format!("{}: {e}", path.display()))),
        None => Ok(EngineConfig::default()),
    }
}

/// Load a JSON location catalog.
pub(crate) fn load_catalog(path: &Path) -> Result<MemoryCatalog, CliError> {
    let catalog = MemoryCatalog::load(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    if catalog.is_empty() {
        return Err(CliError::new(format!("{} contains no locations", path.display())));
    }
    Ok(catalog)
}

/// A simulated player's guess: `actual` moved by up to `spread_deg` on each axis.
///
/// Latitude is clamped to the poles and longitude wrapped into `[-180, 180]`.
pub(crate) fn simulated_guess(actual: Coordinate, spread_deg: f64, rng: &mut impl Rng) -> Coordinate {
    let latitude = (actual.latitude() + rng.random_range(-spread_deg..=spread_deg)).clamp(-90.0, 90.0);
    let mut longitude = actual.longitude() + rng.random_range(-spread_deg..=spread_deg);
    if longitude > 180.0 {
        longitude -= 360.0;
    } else if longitude < -180.0 {
        longitude += 360.0;
    }
    // In range after clamping and a single wrap for spreads up to 180 degrees.
    Coordinate::new(latitude, longitude.clamp(-180.0, 180.0)).unwrap_or(actual)
}
