//! Game and backend configuration.
//!
//! Read from a JSON file in the user's config directory. Missing fields take
//! their defaults, and a missing or broken file falls back to the defaults
//! entirely.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::game::{abilities::BOMB_RADIUS, cluster::MIN_CLUSTER_SIZE, state::ScoringRules};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "elemental-pop";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning for the bubble engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest same-color group that pops.
    pub min_cluster_size: usize,
    /// Bomb blast radius in hex steps.
    pub bomb_radius: i32,
    pub scoring: ScoringRules,
    /// Chance a reload picks a color still on the board (0.0 - 1.0).
    pub color_weighting: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: MIN_CLUSTER_SIZE,
            bomb_radius: BOMB_RADIUS,
            scoring: ScoringRules::default(),
            color_weighting: 0.7,
        }
    }
}

/// Tuning for the reward backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Default page size for reward history.
    pub history_limit: usize,
    /// Default leaderboard size.
    pub leaderboard_limit: usize,
    /// Upper bound on a requested leaderboard size.
    pub max_leaderboard_limit: usize,
    /// Where the ledger snapshot lives; `None` uses the user data directory.
    pub ledger_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            leaderboard_limit: 10,
            max_leaderboard_limit: 100,
            ledger_path: None,
        }
    }
}

impl ServerConfig {
    /// The configured ledger path, or `<data dir>/elemental-pop/ledger.json`.
    pub fn ledger_path(&self) -> Option<PathBuf> {
        self.ledger_path
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("ledger.json")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub server: ServerConfig,
}

impl GameConfig {
    /// `<config dir>/elemental-pop/config.json`.
    pub fn file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "engine": { "bomb_radius": 3 } }"#).unwrap();
        assert_eq!(config.engine.bomb_radius, 3);
        assert_eq!(config.engine.min_cluster_size, 3);
        assert_eq!(config.server.history_limit, 50);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("elemental-pop-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let mut config = GameConfig::default();
        config.server.leaderboard_limit = 25;
        config.save_to(&path).unwrap();
        assert_eq!(GameConfig::load_from(&path).unwrap(), config);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
