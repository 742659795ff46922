//! Run-to-completion container lifecycle
//!
//! `Created -> Running -> {Completed, Failed}`, then `Deleted` unless the
//! container is kept. Only a create failure is fatal; run and delete errors
//! are logged and the run's exit code is what the caller gets back.

use crate::{Result, RuntimeFlags};
use lvm_provider::{ContainerId, ContainerRunner, InvocationSpec, RunOptions};

/// Where a container ended up when the driver returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Completed,
    Failed,
    Deleted,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Lifecycle switches taken from the runtime flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleOptions {
    /// Don't wait for the contained process
    pub detached: bool,
    /// Don't remove the container afterwards
    pub keep: bool,
}

impl From<&RuntimeFlags> for LifecycleOptions {
    fn from(flags: &RuntimeFlags) -> Self {
        Self {
            detached: flags.detached,
            keep: flags.keep,
        }
    }
}

/// Result of one invocation
#[derive(Debug, Clone)]
pub struct LifecycleOutcome {
    pub container_id: ContainerId,
    pub container_name: Option<String>,
    /// Exit code to hand to the host process
    pub exit_code: i32,
    pub state: LifecycleState,
}

/// Sequences create, run and delete against a runner
pub struct LifecycleDriver<'a> {
    runner: &'a dyn ContainerRunner,
}

impl<'a> LifecycleDriver<'a> {
    pub fn new(runner: &'a dyn ContainerRunner) -> Self {
        Self { runner }
    }

    /// Drive one invocation. Consumes the spec.
    ///
    /// A detached container is never removed here: it is still running when
    /// the driver returns, and the spec's auto-remove flag covers cleanup.
    pub async fn execute(
        &self,
        spec: InvocationSpec,
        options: LifecycleOptions,
    ) -> Result<LifecycleOutcome> {
        let container_id = self.runner.create(&spec).await?;
        let mut state = LifecycleState::Created;
        tracing::debug!("Container {} {}", container_id.short(), state);

        let run_options = RunOptions {
            detached: options.detached,
            tty: spec.tty,
            interactive: spec.stdin_open,
        };

        state = LifecycleState::Running;
        let outcome = self.runner.run(&container_id, &run_options).await;
        let exit_code = process_exit_code(outcome.exit_code);

        if let Some(e) = &outcome.error {
            tracing::warn!("Container {} run error: {}", container_id.short(), e);
            state = LifecycleState::Failed;
        } else if !options.detached {
            state = LifecycleState::Completed;
        }
        tracing::debug!(
            "Container {} {} with exit code {}",
            container_id.short(),
            state,
            exit_code
        );

        if !options.keep && !options.detached {
            match self.runner.remove(&container_id).await {
                Ok(()) => {
                    state = LifecycleState::Deleted;
                    tracing::debug!("Container {} {}", container_id.short(), state);
                }
                Err(e) => {
                    tracing::warn!("Failed to remove container {}: {}", container_id.short(), e);
                }
            }
        }

        Ok(LifecycleOutcome {
            container_id,
            container_name: spec.name,
            exit_code,
            state,
        })
    }
}

/// Narrow a runtime exit code to a process exit status
pub fn process_exit_code(code: i64) -> i32 {
    i32::try_from(code).unwrap_or(1)
}
