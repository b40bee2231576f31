//! Engine configuration.
//!
//! Configuration is plain data with sensible defaults. It can be loaded from
//! a JSON file where every field is optional:
//!
//! ```json
//! {
//!   "scoring": { "max_points": 5000, "decay_km": 2000.0, "saturation_km": 20000.0 },
//!   "session_rounds": 5,
//!   "seed": 42
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Upper bound accepted for [`ScoringConfig::max_points`].
pub const MAX_POINTS_LIMIT: u32 = 1_000_000;

/// Shape of the distance-to-points curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points for a perfect guess.
    pub max_points: u32,
    /// Exponential decay length in kilometres.
    pub decay_km: f64,
    /// Distance at and beyond which a guess scores zero.
    pub saturation_km: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_points: 5000,
            decay_km: 2000.0,
            saturation_km: 20_000.0,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scoring curve.
    pub scoring: ScoringConfig,
    /// Number of rounds in a solo session.
    pub session_rounds: u8,
    /// Seed for location selection. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            session_rounds: 5,
            seed: None,
        }
    }
}

/// Error loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON for [`EngineConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl EngineConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scoring.max_points == 0 {
            return Err(ConfigError::Invalid("scoring.max_points must be positive"));
        }
        if self.scoring.max_points > MAX_POINTS_LIMIT {
            return Err(ConfigError::Invalid("scoring.max_points must be at most 1000000"));
        }
        if !(self.scoring.decay_km.is_finite() && self.scoring.decay_km > 0.0) {
            return Err(ConfigError::Invalid("scoring.decay_km must be positive"));
        }
        if !(self.scoring.saturation_km.is_finite() && self.scoring.saturation_km > 0.0) {
            return Err(ConfigError::Invalid("scoring.saturation_km must be positive"));
        }
        if self.session_rounds == 0 {
            return Err(ConfigError::Invalid("session_rounds must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.max_points, 5000);
        assert_eq!(config.session_rounds, 5);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "seed": 7, "scoring": { "decay_km": 1500.0 } }"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.seed, Some(7));
        assert!((config.scoring.decay_km - 1500.0).abs() < 1e-9);
        assert_eq!(config.scoring.max_points, 5000);
        assert_eq!(config.session_rounds, 5);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "session_rounds": 0 }"#).unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_max_points_is_capped() {
        let mut config = EngineConfig::default();
        config.scoring.max_points = MAX_POINTS_LIMIT;
        assert!(config.validate().is_ok());

        config.scoring.max_points = MAX_POINTS_LIMIT + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.scoring.max_points = u32::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
