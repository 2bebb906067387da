//! Host loop configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`TickConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tick_rate must be a positive finite number, got {0}")]
    InvalidTickRate(f64),
}

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidTickRate`] for a non-positive tick rate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Read and parse a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the errors of [`TickConfig::from_json`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject settings the loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTickRate`] unless `tick_rate` is finite
    /// and positive.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        Ok(self)
    }

    /// Seconds of game time covered by one tick.
    #[must_use]
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.tick_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TickConfig::default();
        assert!((config.tick_rate - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.max_ticks, 0);
        assert!((config.frame_dt() - 1.0 / 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = TickConfig::from_json(r#"{ "max_ticks": 120 }"#).unwrap();
        assert_eq!(config.max_ticks, 120);
        assert!((config.tick_rate - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_full_json() {
        let config = TickConfig::from_json(r#"{ "tick_rate": 30.0, "max_ticks": 5 }"#).unwrap();
        assert_eq!(
            config,
            TickConfig {
                tick_rate: 30.0,
                max_ticks: 5
            }
        );
    }

    #[test]
    fn test_rejects_bad_tick_rate() {
        let err = TickConfig::from_json(r#"{ "tick_rate": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTickRate(_)));
        assert!(TickConfig::from_json(r#"{ "tick_rate": -1.0 }"#).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = TickConfig::from_json("{ tick_rate: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TickConfig::load(Path::new("/nonexistent/tick.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/tick.json"));
    }
}
