//! lvm - run development tools in containers

mod cli;
mod commands;

use anyhow::{anyhow, Context};
use clap::FromArgMatches;
use cli::Cli;
use lvm_config::{expand_path, AppConfig, Environment, APP_NAME};
use lvm_core::AliasRegistry;
use std::ffi::OsString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let args: Vec<OsString> = std::env::args_os().collect();
    let early = Cli::preparse(&args);

    // Initialize logging
    let default_level = if early.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let working_dir = std::env::current_dir().context("Failed to determine current directory")?;
    let env = Environment::detect(APP_NAME, early.cache.as_deref())?;

    let explicit_config = early.config.as_deref().map(expand_path);
    let mut config = AppConfig::load(
        explicit_config.as_deref(),
        &[env.home_dir(), working_dir.as_path()],
    )?;
    let registry = AliasRegistry::from_services(&config.services)?;

    let mut command = cli::build_command(&registry);
    let matches = command.clone().get_matches_from(&args);
    let cli = Cli::from_arg_matches(&matches)?;

    if cli.version {
        println!("{}", cli::version_string());
        return Ok(0);
    }

    let Some((name, sub_matches)) = matches.subcommand() else {
        command.print_help()?;
        return Ok(0);
    };

    let entry = registry
        .get(name)
        .ok_or_else(|| anyhow!("Unknown alias '{}'", name))?;

    if let Some(provider) = &cli.provider {
        config.runtime.provider = provider.clone();
    }

    let flags = cli.runtime_flags();
    let args = cli::alias_args(sub_matches);
    tracing::debug!("Invoking '{}' ({}) with {:?}", name, entry.service.image, args);

    commands::run_alias(entry, &env, &flags, &config.runtime, &args, &working_dir).await
}
