//! Error types for configuration parsing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config at {path}: {source}")]
    TomlParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON config at {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to parse YAML config at {path}: {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported config format: {0} (expected .toml, .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid service '{service}': {reason}")]
    InvalidService { service: String, reason: String },

    #[error("Failed to determine home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
