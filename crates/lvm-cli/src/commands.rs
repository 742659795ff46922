//! Alias invocation

use anyhow::{Context, Result};
use lvm_config::{Environment, RuntimeConfig};
use lvm_core::{AliasEntry, LifecycleDriver, LifecycleOptions, RuntimeFlags};
use lvm_provider::{create_default_runner, ContainerRunner};
use std::path::Path;

/// Run one alias to completion and return the exit code for the host process
pub async fn run_alias(
    entry: &AliasEntry,
    env: &Environment,
    flags: &RuntimeFlags,
    runtime: &RuntimeConfig,
    args: &[String],
    working_dir: &Path,
) -> Result<i32> {
    let spec = entry
        .prepare(env, flags, args, working_dir)
        .with_context(|| format!("Failed to prepare '{}'", entry.name))?;

    let runner = connect(runtime).await?;
    let outcome = LifecycleDriver::new(runner.as_ref())
        .execute(spec, LifecycleOptions::from(flags))
        .await?;

    if flags.detached {
        match &outcome.container_name {
            Some(name) => println!("{}", name),
            None => println!("{}", outcome.container_id),
        }
    }

    Ok(outcome.exit_code)
}

async fn connect(runtime: &RuntimeConfig) -> Result<Box<dyn ContainerRunner>> {
    let runner = create_default_runner(runtime).await?;
    let info = runner.info();
    tracing::debug!("Using {} (API {})", info.provider_type, info.api_version);
    Ok(runner)
}
