use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use worldsync_common::position::MAX_DISTANCE;

/// Errors from loading or validating a [`SyncConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Synchronization configuration: view capacity, admission burst and tick budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of mobs in one local view. The client counts them in a byte.
    pub max_local_mobs: usize,
    /// Maximum number of mobs admitted into one view per tick.
    pub new_mobs_per_tick: usize,
    /// Viewing distance players start with and grow back towards.
    pub default_viewing_distance: i32,
    /// Wall-clock budget for synchronizing every observer in one tick.
    pub tick_budget_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_local_mobs: 255,
            new_mobs_per_tick: 20,
            default_viewing_distance: MAX_DISTANCE,
            tick_budget_ms: 600,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_local_mobs == 0 || self.max_local_mobs > 255 {
            return Err(ConfigError::Invalid {
                field: "max_local_mobs",
                reason: format!("{} is outside 1..=255", self.max_local_mobs),
            });
        }
        if self.new_mobs_per_tick == 0 {
            return Err(ConfigError::Invalid {
                field: "new_mobs_per_tick",
                reason: "must admit at least one mob per tick".into(),
            });
        }
        if !(1..=MAX_DISTANCE).contains(&self.default_viewing_distance) {
            return Err(ConfigError::Invalid {
                field: "default_viewing_distance",
                reason: format!(
                    "{} is outside 1..={MAX_DISTANCE}",
                    self.default_viewing_distance
                ),
            });
        }
        Ok(())
    }

    pub fn tick_budget(&self) -> Duration {
        Duration::from_millis(self.tick_budget_ms)
    }
}
