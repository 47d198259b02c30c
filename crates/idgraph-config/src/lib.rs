//! # Idgraph Config - Configuration Management
//!
//! Handles configuration loading from files and environment variables.
//! The store section selects the persistence backend and lists the
//! attribute names opted into eager indexing; the observability section
//! feeds the logging layer.

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file plus
    /// `IDGRAPH_`-prefixed environment variables (`__` separates nesting,
    /// e.g. `IDGRAPH_STORE__BACKEND=memory`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix("IDGRAPH").separator("__"))
            .build()?
            .try_deserialize()
    }
}

/// An attribute name of one kind opted into eager indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedAttribute {
    /// The relationship kind's `type_id`.
    pub kind: String,

    /// The attribute name to index.
    pub attribute: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Persistence backend selector ("memory" is the only built-in).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Attributes indexed eagerly; everything else falls back to a
    /// linear filter pass at query time.
    #[serde(default)]
    pub indexed_attributes: Vec<IndexedAttribute>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            indexed_attributes: Vec::new(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.backend, "memory");
        assert!(config.store.indexed_attributes.is_empty());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_deserializes_from_toml() {
        let raw = r#"
            [store]
            backend = "memory"

            [[store.indexed_attributes]]
            kind = "authorization"
            attribute = "accessToken"

            [observability]
            log_level = "debug"
        "#;
        let config: Config = ConfigBuilder::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.store.indexed_attributes.len(), 1);
        assert_eq!(config.store.indexed_attributes[0].kind, "authorization");
        assert_eq!(
            config.store.indexed_attributes[0].attribute,
            "accessToken"
        );
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let raw = r#"
            [observability]
            log_level = "warn"
        "#;
        let config: Config = ConfigBuilder::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.observability.log_level, "warn");
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/idgraph.toml"))).unwrap();
        assert_eq!(config.store.backend, "memory");
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut config = Config::default();
        config.store.indexed_attributes.push(IndexedAttribute {
            kind: "authorization".to_string(),
            attribute: "accessToken".to_string(),
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.store.indexed_attributes.len(), 1);
    }
}
