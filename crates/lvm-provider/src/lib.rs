//! Container runner trait and implementations for lvm
//!
//! This crate provides an abstraction over container runtimes (Docker, Podman)
//! covering the three primitives lvm needs: create, run and remove.

mod docker;
mod error;
mod types;

pub use docker::DockerProvider;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use lvm_config::RuntimeConfig;

/// Exit code reported when the runtime fails before the container produced one
pub const RUNTIME_FAILURE_EXIT_CODE: i64 = 125;

/// Trait for container runners (Docker, Podman, etc.)
#[async_trait]
pub trait ContainerRunner: Send + Sync {
    /// Materialize a container from an invocation spec
    async fn create(&self, spec: &InvocationSpec) -> Result<ContainerId>;

    /// Start a created container.
    ///
    /// Unless `options.detached` is set this blocks until the contained
    /// process exits. The outcome always carries an exit code, even when an
    /// error is reported alongside it.
    async fn run(&self, id: &ContainerId, options: &RunOptions) -> RunOutcome;

    /// Remove a container
    async fn remove(&self, id: &ContainerId) -> Result<()>;

    /// Get runner information
    fn info(&self) -> ProviderInfo;
}

/// Factory function to create a runner based on type
pub async fn create_runner(
    provider_type: ProviderType,
    config: &RuntimeConfig,
) -> Result<Box<dyn ContainerRunner>> {
    match provider_type {
        ProviderType::Docker => {
            let provider = DockerProvider::new(&config.docker_socket()).await?;
            Ok(Box::new(provider))
        }
        ProviderType::Podman => {
            // Podman is driven through its Docker-compatible API
            let provider = DockerProvider::new_podman(&config.podman_socket()).await?;
            Ok(Box::new(provider))
        }
    }
}

/// Create the runner selected by config, auto-detecting when unset.
///
/// Auto-detection tries Docker first, then Podman.
pub async fn create_default_runner(config: &RuntimeConfig) -> Result<Box<dyn ContainerRunner>> {
    let provider_type = match config.provider.as_str() {
        "" => {
            tracing::debug!("No provider configured, auto-detecting...");
            match create_runner(ProviderType::Docker, config).await {
                Ok(runner) => return Ok(runner),
                Err(e) => {
                    tracing::debug!("Docker unavailable ({}), trying Podman", e);
                    ProviderType::Podman
                }
            }
        }
        other => other.parse().map_err(ProviderError::ConfigError)?,
    };

    let socket_path = match provider_type {
        ProviderType::Podman => config.podman_socket(),
        ProviderType::Docker => config.docker_socket(),
    };

    create_runner(provider_type, config).await.map_err(|e| {
        let socket_exists = std::path::Path::new(&socket_path).exists();
        ProviderError::ConnectionError(format_connection_error(
            provider_type,
            &socket_path,
            socket_exists,
            &e,
        ))
    })
}

/// Format a helpful connection error message with actionable instructions
fn format_connection_error(
    provider: ProviderType,
    socket_path: &str,
    socket_exists: bool,
    underlying: &ProviderError,
) -> String {
    let provider_name = match provider {
        ProviderType::Podman => "Podman",
        ProviderType::Docker => "Docker",
    };

    let mut msg = format!("Cannot connect to {}\n\n", provider_name);

    if !socket_exists {
        msg.push_str(&format!(
            "The {} API socket was not found at:\n  {}\n\n",
            provider_name, socket_path
        ));

        match provider {
            ProviderType::Podman => {
                msg.push_str("To enable the Podman socket, run:\n");
                msg.push_str("  systemctl --user enable --now podman.socket\n");
            }
            ProviderType::Docker => {
                msg.push_str("To start Docker, run:\n");
                msg.push_str("  sudo systemctl enable --now docker\n");
            }
        }
    } else {
        msg.push_str(&format!(
            "The socket exists at {} but the daemon is not responding.\n\n",
            socket_path
        ));
        msg.push_str(&format!("Underlying error: {}\n", underlying));
    }

    msg
}
