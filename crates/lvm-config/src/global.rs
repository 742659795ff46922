//! Top-level lvm configuration
//!
//! Searched as `lvm.toml`, `lvm.json`, `lvm.yaml` or `lvm.yml`, first in the
//! home directory and then in the current directory, unless an explicit path
//! is given.

use crate::{ConfigError, Result, ServiceDefinition, APP_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Extensions tried during discovery, in order
const CONFIG_EXTENSIONS: &[&str] = &["toml", "json", "yaml", "yml"];

/// Global lvm configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runtime: RuntimeConfig,
    /// Services keyed by their primary alias; ordered so registration is deterministic
    pub services: BTreeMap<String, ServiceDefinition>,
}

/// Container runtime selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// "docker", "podman", or empty to auto-detect
    pub provider: String,
    /// API socket; falls back to the provider's default
    pub socket: Option<String>,
}

impl RuntimeConfig {
    /// Socket to use for Docker
    pub fn docker_socket(&self) -> String {
        self.socket.clone().unwrap_or_else(default_docker_socket)
    }

    /// Socket to use for Podman
    pub fn podman_socket(&self) -> String {
        self.socket.clone().unwrap_or_else(default_podman_socket)
    }
}

#[cfg(windows)]
fn default_docker_socket() -> String {
    "//./pipe/docker_engine".to_string()
}

#[cfg(not(windows))]
fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn default_podman_socket() -> String {
    std::env::var("XDG_RUNTIME_DIR")
        .map(|dir| format!("{}/podman/podman.sock", dir))
        .unwrap_or_else(|_| "/run/user/1000/podman/podman.sock".to_string())
}

#[cfg(target_os = "macos")]
fn default_podman_socket() -> String {
    directories::BaseDirs::new()
        .map(|dirs| {
            format!(
                "{}/.local/share/containers/podman/machine/podman-machine-default/podman.sock",
                dirs.home_dir().display()
            )
        })
        .unwrap_or_else(|| "/var/run/podman.sock".to_string())
}

#[cfg(windows)]
fn default_podman_socket() -> String {
    "//./pipe/podman-machine-default".to_string()
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the search directories are
    /// tried in order and a missing file yields an empty configuration.
    pub fn load(explicit: Option<&Path>, search_dirs: &[&Path]) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from(path)
            }
            None => match Self::discover(search_dirs) {
                Some(path) => Self::load_from(&path),
                None => {
                    tracing::debug!("No config file found, no services registered");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Find the first config file in the given directories
    pub fn discover(search_dirs: &[&Path]) -> Option<PathBuf> {
        search_dirs.iter().find_map(|dir| {
            CONFIG_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", APP_NAME, ext)))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Load configuration from a specific path, chosen format by extension
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content).map_err(|e| ConfigError::TomlParseError {
                path: path.to_path_buf(),
                source: e,
            })?,
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                ConfigError::JsonParseError {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                ConfigError::YamlParseError {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        config.validate()?;

        tracing::debug!(
            "Loaded config from {:?}: {} service(s)",
            path,
            config.services.len()
        );

        Ok(config)
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check every service definition
    pub fn validate(&self) -> Result<()> {
        for (name, service) in &self.services {
            service
                .validate()
                .map_err(|reason| ConfigError::InvalidService {
                    service: name.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}
