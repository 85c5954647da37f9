use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::db::DEFAULT_MAX_CONNECTIONS;

const DATABASE_PATH_VAR: &str = "KITCHENOPS_DATABASE_PATH";
const MAX_CONNECTIONS_VAR: &str = "KITCHENOPS_MAX_CONNECTIONS";

/// Source of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Upper bound for the connection pool
    pub max_connections: ConfigValue<u32>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    max_connections: Option<u32>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("Invalid value '{value}' for {name}: expected a positive integer")]
    InvalidEnv { name: &'static str, value: String },
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("kitchenops.db"),
            ConfigSource::Default,
        );
        let mut max_connections = ConfigValue::new(DEFAULT_MAX_CONNECTIONS, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            if let Some(db_path) = file_config.database_path {
                // Relative paths are relative to the config file
                let resolved = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(n) = file_config.max_connections {
                max_connections = ConfigValue::new(n, ConfigSource::File);
            }
            config_file = Some(path);
        }

        if let Ok(db_path) = std::env::var(DATABASE_PATH_VAR) {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(raw) = std::env::var(MAX_CONNECTIONS_VAR) {
            let n = parse_connections(&raw).ok_or(ConfigError::InvalidEnv {
                name: MAX_CONNECTIONS_VAR,
                value: raw.clone(),
            })?;
            max_connections = ConfigValue::new(n, ConfigSource::Environment);
        }

        Ok(Self {
            database_path,
            max_connections,
            config_file,
        })
    }

    /// Platform config directory, e.g. `~/.config/kitchenops/` on Linux.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kitchenops")
    }

    /// Platform data directory, e.g. `~/.local/share/kitchenops/` on Linux.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kitchenops")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_connections(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
