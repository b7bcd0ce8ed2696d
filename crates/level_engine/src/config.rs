//! Configuration system

use serde::{Deserialize, Serialize};

/// Configuration trait for anything loadable from a TOML file.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Capacities and loader settings for a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Upper bound on live entities, including queued additions
    pub max_entity_count: usize,

    /// Model asset slots
    pub model_capacity: usize,

    /// Skybox asset slots
    pub skybox_capacity: usize,

    /// Terrain asset slots
    pub terrain_capacity: usize,

    /// Retain CPU-side vertex/index copies at model load for editor ray picking
    pub store_vertices: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            max_entity_count: 1024,
            model_capacity: 1024,
            skybox_capacity: 16,
            terrain_capacity: 16,
            store_vertices: false,
        }
    }
}

impl Config for LevelConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_level_capacities() {
        let config = LevelConfig::default();
        assert_eq!(config.max_entity_count, 1024);
        assert_eq!(config.model_capacity, 1024);
        assert_eq!(config.skybox_capacity, 16);
        assert_eq!(config.terrain_capacity, 16);
        assert!(!config.store_vertices);
    }

    #[test]
    fn parses_partial_toml() {
        let config: LevelConfig = toml::from_str("max_entity_count = 64\nstore_vertices = true\n")
            .expect("valid config");
        assert_eq!(config.max_entity_count, 64);
        assert!(config.store_vertices);
        assert_eq!(config.model_capacity, 1024);
    }
}
