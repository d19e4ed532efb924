//! Configuration for index construction and synchronization.
//!
//! Every field has a serde default so partial JSON or TOML documents load.
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// # Example
///
/// ```rust
/// use mobility::Config;
///
/// let json = r#"{
///     "index": { "max_depth": 16 },
///     "sync": { "crossings": true }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.index.max_depth, 16);
/// assert_eq!(config.index.leaf_capacity, 1);
/// assert!(config.sync.crossings);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

/// Box octree construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Depth at which splitting stops and the remaining batch becomes one leaf
    #[serde(default = "IndexConfig::default_max_depth")]
    pub max_depth: usize,

    /// Batches of at most this many boxes are stored in a single leaf
    #[serde(default = "IndexConfig::default_leaf_capacity")]
    pub leaf_capacity: usize,
}

impl IndexConfig {
    const fn default_max_depth() -> usize {
        32
    }

    const fn default_leaf_capacity() -> usize {
        1
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            leaf_capacity: Self::default_leaf_capacity(),
        }
    }
}

/// Synchronizer settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Insert synthetic timestamps where the two signals cross
    #[serde(default)]
    pub crossings: bool,
}

impl Config {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.index.max_depth = depth;
        self
    }

    pub fn with_leaf_capacity(mut self, capacity: usize) -> Self {
        self.index.leaf_capacity = capacity;
        self
    }

    pub fn with_crossings(mut self, crossings: bool) -> Self {
        self.sync.crossings = crossings;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.index.max_depth == 0 {
            return Err("Index max depth must be greater than zero".to_string());
        }
        if self.index.leaf_capacity == 0 {
            return Err("Index leaf capacity must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.index.max_depth, 32);
        assert_eq!(config.index.leaf_capacity, 1);
        assert!(!config.sync.crossings);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_max_depth(8)
            .with_leaf_capacity(4)
            .with_crossings(true);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.index.leaf_capacity = 0;
        assert!(config.validate().is_err());

        config.index.leaf_capacity = 1;
        config.index.max_depth = 0;
        assert!(config.validate().is_err());

        assert!(Config::from_json(r#"{ "index": { "max_depth": 0 } }"#).is_err());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(Config::from_json(r#"{ "geohash_precision": 8 }"#).is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml() {
        let config = Config::from_toml("[sync]\ncrossings = true\n").unwrap();
        assert!(config.sync.crossings);
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
