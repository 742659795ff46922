//! Error types for lvm-core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] lvm_config::ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] lvm_provider::ProviderError),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Alias '{name}' of service '{service}' is already registered by '{existing}'")]
    DuplicateAlias {
        name: String,
        service: String,
        existing: String,
    },

    #[error("Invalid alias name '{name}' for service '{service}'")]
    InvalidAlias { name: String, service: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
