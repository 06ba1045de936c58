//! Simulation configuration.
//!
//! Every tunable in the engine hangs off [`SimConfig`]. Missing fields in a
//! JSON file fall back to the defaults, so a config only needs to name what
//! it changes.

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::ConfigError;
use crate::game::box_score::MvpWeights;
use crate::game::physics::FieldingCurve;
use crate::stats::era::NormalizerConfig;

/// Innings in a regulation game.
pub const REGULATION_INNINGS: u16 = 9;

/// How a batting order is formed from the provider's roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineupStrategy {
    /// First nine listed batters, in listed order.
    #[default]
    AsListed,
    /// Reorder by on-base and slugging profile.
    Optimized,
}

/// Rules of play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Innings before extra innings begin.
    pub regulation_innings: u16,
    /// Hard stop for extra innings. `None` plays until decided.
    pub max_innings: Option<u16>,
    /// Batting order construction.
    pub lineup_strategy: LineupStrategy,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            regulation_innings: REGULATION_INNINGS,
            max_innings: None,
            lineup_strategy: LineupStrategy::AsListed,
        }
    }
}

/// Top-level configuration for a simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Era normalization thresholds
    pub normalizer: NormalizerConfig,
    /// Short-of-fence fielding model
    pub fielding: FieldingCurve,
    /// MVP composite weights
    pub mvp: MvpWeights,
    /// Rules of play
    pub rules: GameRules,
}

impl SimConfig {
    /// Parse a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = SimConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.rules.regulation_innings, 9);
        assert_eq!(config.rules.max_innings, None);
    }

    #[test]
    fn test_partial_override() {
        let config = SimConfig::from_json_str(
            r#"{ "rules": { "max_innings": 12, "lineup_strategy": "Optimized" } }"#,
        )
        .unwrap();

        assert_eq!(config.rules.max_innings, Some(12));
        assert_eq!(config.rules.lineup_strategy, LineupStrategy::Optimized);
        assert_eq!(config.rules.regulation_innings, 9);
        assert_eq!(config.fielding, FieldingCurve::default());
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut config = SimConfig::default();
        config.mvp.home_run = 5.0;
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
