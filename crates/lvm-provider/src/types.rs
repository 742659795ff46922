//! Common types for container runners

use crate::{ProviderError, Result};
use std::collections::BTreeMap;

/// Container ID wrapper
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        if self.0.len() > 12 {
            &self.0[..12]
        } else {
            &self.0
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Container runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Docker,
    Podman,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Podman => write!(f, "podman"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "podman" => Ok(Self::Podman),
            _ => Err(format!("Unknown provider type: {}", s)),
        }
    }
}

/// Network attachment of the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    /// Share the host network stack; port mappings do not apply
    #[default]
    Host,
    /// Isolated network with published ports
    Bridge,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Bridge => "bridge",
        }
    }
}

impl std::fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bind mount from a host path to a container path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    /// Host path
    pub source: String,
    /// Path in container
    pub target: String,
    /// Read-only
    pub read_only: bool,
}

impl MountConfig {
    pub fn bind(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }
}

/// Fully resolved description of one container run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationSpec {
    /// Container name
    pub name: Option<String>,
    /// Image reference, including any tag override
    pub image: String,
    /// Effective tag of `image`
    pub tag: String,
    /// Command argv
    pub cmd: Vec<String>,
    /// Entrypoint override; `None` keeps the image default
    pub entrypoint: Option<Vec<String>>,
    /// Environment in `KEY=VALUE` form; later entries win on duplicate keys
    pub env: Vec<String>,
    /// Working directory
    pub working_dir: Option<String>,
    /// User to run as
    pub user: Option<String>,
    /// Bind mounts, in order
    pub mounts: Vec<MountConfig>,
    pub network_mode: NetworkMode,
    /// Port specs as typed by the user; only set in bridge mode
    pub ports: Vec<String>,
    /// Labels
    pub labels: BTreeMap<String, String>,
    /// Allocate TTY
    pub tty: bool,
    /// Keep STDIN open
    pub stdin_open: bool,
    /// Let the runtime remove the container when it exits
    pub auto_remove: bool,
}

/// Published port parsed from `[host_ip:][host_port:]container_port[/protocol]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Host port (None for auto-assign)
    pub host_port: Option<u16>,
    /// Container port
    pub container_port: u16,
    /// Protocol (tcp/udp)
    pub protocol: String,
    /// Host IP to bind to
    pub host_ip: Option<String>,
}

impl PortConfig {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || ProviderError::ConfigError(format!("invalid port spec '{}'", spec));

        let (addr, protocol) = match spec.rsplit_once('/') {
            Some((addr, proto)) if !proto.is_empty() => (addr, proto.to_lowercase()),
            Some(_) => return Err(invalid()),
            None => (spec, "tcp".to_string()),
        };

        let parse_port = |s: &str| s.parse::<u16>().map_err(|_| invalid());

        let parts: Vec<&str> = addr.split(':').collect();
        let (host_ip, host_port, container_port) = match parts.as_slice() {
            [container] => (None, None, parse_port(container)?),
            [host, container] => (None, Some(parse_port(host)?), parse_port(container)?),
            [ip, host, container] => {
                let host_port = if host.is_empty() {
                    None
                } else {
                    Some(parse_port(host)?)
                };
                (Some(ip.to_string()), host_port, parse_port(container)?)
            }
            _ => return Err(invalid()),
        };

        Ok(Self {
            host_port,
            container_port,
            protocol,
            host_ip,
        })
    }

    /// Key used by the Docker API, e.g. `80/tcp`
    pub fn container_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Options for running a created container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Return right after start instead of waiting for exit
    pub detached: bool,
    /// The container has a TTY
    pub tty: bool,
    /// Forward host stdin
    pub interactive: bool,
}

/// What a run produced: always an exit code, possibly an error alongside it
#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: i64,
    pub error: Option<ProviderError>,
}

impl RunOutcome {
    pub fn exited(exit_code: i64) -> Self {
        Self {
            exit_code,
            error: None,
        }
    }

    pub fn failed(exit_code: i64, error: ProviderError) -> Self {
        Self {
            exit_code,
            error: Some(error),
        }
    }
}

/// Runner information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub provider_type: ProviderType,
    pub api_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_short() {
        let id = ContainerId::new("0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789ab");
        assert_eq!(ContainerId::new("abc").short(), "abc");
    }

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!("Docker".parse::<ProviderType>(), Ok(ProviderType::Docker));
        assert_eq!("podman".parse::<ProviderType>(), Ok(ProviderType::Podman));
        assert!("lxc".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_parse_port_specs() {
        let p = PortConfig::parse("8080").unwrap();
        assert_eq!((p.host_port, p.container_port), (None, 8080));
        assert_eq!(p.container_key(), "8080/tcp");

        let p = PortConfig::parse("3000:80").unwrap();
        assert_eq!((p.host_port, p.container_port), (Some(3000), 80));

        let p = PortConfig::parse("127.0.0.1:5353:53/udp").unwrap();
        assert_eq!(p.host_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(p.host_port, Some(5353));
        assert_eq!(p.container_key(), "53/udp");

        let p = PortConfig::parse("127.0.0.1::80").unwrap();
        assert_eq!(p.host_port, None);
    }

    #[test]
    fn test_parse_invalid_port_specs() {
        for spec in ["", "http", "1:2:3:4", "80/", "99999"] {
            assert!(PortConfig::parse(spec).is_err(), "{} should be rejected", spec);
        }
    }

    #[test]
    fn test_network_mode_display() {
        assert_eq!(NetworkMode::default(), NetworkMode::Host);
        assert_eq!(NetworkMode::Bridge.to_string(), "bridge");
    }
}
