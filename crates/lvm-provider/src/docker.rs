//! Docker runner implementation using bollard

use crate::{
    ContainerId, ContainerRunner, InvocationSpec, PortConfig, ProviderError, ProviderInfo,
    ProviderType, Result, RunOptions, RunOutcome, RUNTIME_FAILURE_EXIT_CODE,
};
use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, AttachContainerResults, Config, CreateContainerOptions, LogOutput,
    RemoveContainerOptions, ResizeContainerTtyOptions, StartContainerOptions,
    WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::service::{HostConfig, Mount, MountTypeEnum, PortBinding};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Docker runner using bollard crate
pub struct DockerProvider {
    client: Docker,
    provider_type: ProviderType,
}

impl DockerProvider {
    /// Create a new Docker runner
    pub async fn new(socket_path: &str) -> Result<Self> {
        let client = if socket_path.starts_with("unix://") || socket_path.starts_with('/') {
            let path = socket_path.trim_start_matches("unix://");
            Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
        } else if socket_path.starts_with("http://") || socket_path.starts_with("https://") {
            Docker::connect_with_http(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
        } else {
            // Assume it's a unix socket path
            Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
        };

        // Test connection
        client
            .ping()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            provider_type: ProviderType::Docker,
        })
    }

    /// Create a new runner for Podman (uses Docker-compatible API)
    pub async fn new_podman(socket_path: &str) -> Result<Self> {
        let mut provider = Self::new(socket_path).await?;
        provider.provider_type = ProviderType::Podman;
        Ok(provider)
    }

    /// Pull the image unless it is already present locally
    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.client.inspect_image(image).await.is_ok() {
            return Ok(());
        }

        let reference = qualified_image_ref(image);
        tracing::info!("Pulling image {}", reference);

        let options = CreateImageOptions {
            from_image: reference.as_str(),
            ..Default::default()
        };

        let mut stream = self.client.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(error) = info.error {
                        return Err(ProviderError::ImageNotFound(error));
                    }
                    if let Some(status) = info.status {
                        tracing::debug!("{}", status);
                    }
                }
                Err(e) => return Err(ProviderError::ImageNotFound(format!("{}: {}", reference, e))),
            }
        }

        Ok(())
    }

    /// Start, stream output, and wait for the exit code
    async fn run_attached(&self, id: &ContainerId, options: &RunOptions) -> RunOutcome {
        let attach = AttachContainerOptions::<String> {
            stdin: Some(options.interactive),
            stdout: Some(true),
            stderr: Some(true),
            stream: Some(true),
            ..Default::default()
        };

        let AttachContainerResults { mut output, mut input } =
            match self.client.attach_container(&id.0, Some(attach)).await {
                Ok(results) => results,
                Err(e) => return RunOutcome::failed(RUNTIME_FAILURE_EXIT_CODE, e.into()),
            };

        if let Err(e) = self
            .client
            .start_container(&id.0, None::<StartContainerOptions<String>>)
            .await
        {
            return RunOutcome::failed(RUNTIME_FAILURE_EXIT_CODE, e.into());
        }

        let _raw_mode = if options.tty {
            self.resize_to_terminal(id).await;
            RawModeGuard::enable()
        } else {
            None
        };

        let stdin_task = options.interactive.then(|| {
            tokio::spawn(async move {
                let mut stdin = tokio::io::stdin();
                if let Err(e) = tokio::io::copy(&mut stdin, &mut input).await {
                    tracing::debug!("stdin forwarding stopped: {}", e);
                }
                let _ = input.shutdown().await;
            })
        });

        let mut stream_error = None;
        let mut stdout = tokio::io::stdout();
        let mut stderr = tokio::io::stderr();
        while let Some(chunk) = output.next().await {
            let written = match chunk {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                    write_chunk(&mut stdout, &message).await
                }
                Ok(LogOutput::StdErr { message }) => write_chunk(&mut stderr, &message).await,
                Ok(LogOutput::StdIn { .. }) => Ok(()),
                Err(e) => {
                    stream_error = Some(ProviderError::from(e));
                    break;
                }
            };
            if let Err(e) = written {
                stream_error = Some(ProviderError::IoError(e));
                break;
            }
        }

        if let Some(task) = stdin_task {
            task.abort();
        }

        let outcome = self.wait(id).await;
        match (outcome.error, stream_error) {
            (None, Some(e)) => RunOutcome::failed(outcome.exit_code, e),
            (error, _) => RunOutcome {
                exit_code: outcome.exit_code,
                error,
            },
        }
    }

    /// Block until the container stops
    async fn wait(&self, id: &ContainerId) -> RunOutcome {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = self.client.wait_container(&id.0, Some(options));

        match stream.next().await {
            Some(Ok(response)) => RunOutcome::exited(response.status_code),
            // bollard reports non-zero exits as an error carrying the code
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => {
                RunOutcome::exited(code)
            }
            Some(Err(e)) => RunOutcome::failed(RUNTIME_FAILURE_EXIT_CODE, e.into()),
            None => RunOutcome::failed(
                RUNTIME_FAILURE_EXIT_CODE,
                ProviderError::RuntimeError(format!("no exit status for container {}", id.short())),
            ),
        }
    }

    async fn resize_to_terminal(&self, id: &ContainerId) {
        let Ok((width, height)) = crossterm::terminal::size() else {
            return;
        };
        let options = ResizeContainerTtyOptions { width, height };
        if let Err(e) = self.client.resize_container_tty(&id.0, options).await {
            tracing::debug!("Failed to resize TTY of {}: {}", id.short(), e);
        }
    }
}

#[async_trait]
impl ContainerRunner for DockerProvider {
    async fn create(&self, spec: &InvocationSpec) -> Result<ContainerId> {
        self.ensure_image(&spec.image).await?;

        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.as_str(),
            platform: None,
        });

        // Build port bindings
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();

        for spec_str in &spec.ports {
            let port = PortConfig::parse(spec_str)?;
            let container_port = port.container_key();
            exposed_ports.insert(container_port.clone(), HashMap::new());

            let binding = PortBinding {
                host_ip: port.host_ip.clone(),
                host_port: port.host_port.map(|p| p.to_string()),
            };
            port_bindings
                .entry(container_port)
                .or_insert_with(|| Some(Vec::new()))
                .get_or_insert_with(Vec::new)
                .push(binding);
        }

        let mounts: Vec<Mount> = spec
            .mounts
            .iter()
            .map(|m| Mount {
                target: Some(m.target.clone()),
                source: Some(m.source.clone()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(m.read_only),
                ..Default::default()
            })
            .collect();

        let host_config = HostConfig {
            mounts: if mounts.is_empty() {
                None
            } else {
                Some(mounts)
            },
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            network_mode: Some(spec.network_mode.to_string()),
            auto_remove: Some(spec.auto_remove),
            ..Default::default()
        };

        let labels: HashMap<String, String> = spec
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let container_config = Config {
            image: Some(spec.image.clone()),
            cmd: if spec.cmd.is_empty() {
                None
            } else {
                Some(spec.cmd.clone())
            },
            entrypoint: spec.entrypoint.clone(),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            working_dir: spec.working_dir.clone(),
            user: spec.user.clone(),
            tty: Some(spec.tty),
            open_stdin: Some(spec.stdin_open),
            attach_stdin: Some(spec.stdin_open),
            // Closes the container's stdin once piped input hits EOF
            stdin_once: Some(spec.stdin_open),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            labels: if labels.is_empty() { None } else { Some(labels) },
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(options, container_config)
            .await?;

        for warning in &response.warnings {
            tracing::warn!("{}", warning);
        }

        Ok(ContainerId::new(response.id))
    }

    async fn run(&self, id: &ContainerId, options: &RunOptions) -> RunOutcome {
        if options.detached {
            return match self
                .client
                .start_container(&id.0, None::<StartContainerOptions<String>>)
                .await
            {
                Ok(()) => RunOutcome::exited(0),
                Err(e) => RunOutcome::failed(RUNTIME_FAILURE_EXIT_CODE, e.into()),
            };
        }

        self.run_attached(id, options).await
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        let options = RemoveContainerOptions {
            force: false,
            ..Default::default()
        };
        self.client
            .remove_container(&id.0, Some(options))
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                } => ProviderError::ContainerNotFound(id.to_string()),
                other => other.into(),
            })
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider_type: self.provider_type,
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
        }
    }
}

async fn write_chunk<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> std::io::Result<()> {
    writer.write_all(data).await?;
    writer.flush().await
}

/// Add `:latest` when the reference carries no tag or digest, so a pull
/// fetches one image rather than every tag
fn qualified_image_ref(image: &str) -> String {
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    if last_segment.contains(':') || last_segment.contains('@') {
        image.to_string()
    } else {
        format!("{}:latest", image)
    }
}

/// Puts the host terminal in raw mode for the lifetime of the guard
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Option<Self> {
        match crossterm::terminal::enable_raw_mode() {
            Ok(()) => Some(Self),
            Err(e) => {
                tracing::debug!("Could not enable raw mode: {}", e);
                None
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}
