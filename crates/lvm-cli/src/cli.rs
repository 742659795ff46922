//! Command line definition
//!
//! Global flags are declared with the derive API. Alias subcommands come from
//! the registry at runtime, so the final `Command` is assembled in
//! [`build_command`].

use clap::{Arg, ArgMatches, Command, CommandFactory, FromArgMatches, Parser};
use lvm_core::{AliasRegistry, RuntimeFlags};
use std::ffi::OsString;
use std::io::IsTerminal;

/// Id of the pass-through argument list on every alias subcommand
pub const ALIAS_ARGS: &str = "args";

#[derive(Parser, Debug, Default)]
#[command(name = "lvm")]
#[command(
    about = "Run development tools in throwaway containers",
    long_about = None,
    disable_version_flag = true,
    subcommand_value_name = "ALIAS",
    subcommand_help_heading = "Aliases"
)]
pub struct Cli {
    /// Run the container in the background and print its name
    #[arg(short, long, env = "LVM_DETACHED")]
    pub detach: bool,

    /// User inside the container: <name|uid>[:<group|gid>] (default: host uid:gid)
    #[arg(short, long, env = "LVM_USER")]
    pub user: Option<String>,

    /// Override the image tag
    #[arg(short, long, env = "LVM_TAG")]
    pub tag: Option<String>,

    /// Override the container entrypoint (repeat or comma-separate for several words)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub entrypoint: Vec<String>,

    /// Publish a port, switching to bridge networking
    #[arg(short, long = "port", env = "LVM_PORTS", value_delimiter = ',')]
    pub ports: Vec<String>,

    /// Keep the container after it exits
    #[arg(short, long, env = "LVM_KEEP")]
    pub keep: bool,

    /// Extra KEY=VALUE environment entry, repeatable
    #[arg(short, long = "env", env = "LVM_ENVS")]
    pub envs: Vec<String>,

    /// Don't pass the alias name as the first word of the command
    #[arg(short, long, env = "LVM_SKIP_CMD")]
    pub skip_cmd: bool,

    /// Root cache directory (default: ~/.lvm)
    #[arg(long, env = "LVM_CACHE")]
    pub cache: Option<String>,

    /// Config file (default: lvm.{toml,json,yaml,yml} in home, then current directory)
    #[arg(short, long, env = "LVM_CONFIG")]
    pub config: Option<String>,

    /// Container runtime (docker or podman)
    #[arg(long, env = "LVM_PROVIDER", value_parser = ["docker", "podman"])]
    pub provider: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

impl Cli {
    /// Parse only what is needed before the config is loaded.
    ///
    /// Alias names are unknown at this point, so anything after the first
    /// positional is swallowed as an external subcommand and errors are
    /// ignored. The full parse happens later against [`build_command`].
    pub fn preparse(args: &[OsString]) -> Self {
        Self::command()
            .disable_help_flag(true)
            .allow_external_subcommands(true)
            .ignore_errors(true)
            .try_get_matches_from(args)
            .ok()
            .and_then(|matches| Self::from_arg_matches(&matches).ok())
            .unwrap_or_default()
    }

    /// Flags handed to the invocation builder
    pub fn runtime_flags(&self) -> RuntimeFlags {
        RuntimeFlags {
            detached: self.detach,
            user: self.user.clone().or_else(default_user),
            tag: self.tag.clone(),
            entrypoint: (!self.entrypoint.is_empty()).then(|| self.entrypoint.clone()),
            ports: self.ports.clone(),
            keep: self.keep,
            extra_env: self.envs.clone(),
            skip_command_name: self.skip_cmd,
            tty: std::io::stdin().is_terminal(),
        }
    }
}

/// Full command: global flags plus one subcommand per registered name
pub fn build_command(registry: &AliasRegistry) -> Command {
    registry
        .entries()
        .fold(Cli::command(), |cmd, entry| {
            let mut sub = Command::new(entry.name.clone())
                .about(entry.about())
                .disable_help_flag(true)
                .arg(
                    Arg::new(ALIAS_ARGS)
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                );
            if let Some(long) = entry.long_about() {
                sub = sub.long_about(long);
            }
            cmd.subcommand(sub)
        })
}

/// Arguments following the alias name, verbatim
pub fn alias_args(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(ALIAS_ARGS)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// `<version> - build date <date> - commit: <hash>`
pub fn version_string() -> String {
    format!(
        "{} - build date {} - commit: {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("LVM_BUILD_DATE").unwrap_or("unknown"),
        option_env!("LVM_COMMIT").unwrap_or("unknown"),
    )
}

#[cfg(unix)]
fn default_user() -> Option<String> {
    use nix::unistd::{getegid, geteuid};
    Some(format!("{}:{}", geteuid(), getegid()))
}

#[cfg(not(unix))]
fn default_user() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvm_config::ServiceDefinition;
    use std::collections::BTreeMap;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    fn registry() -> AliasRegistry {
        let mut services = BTreeMap::new();
        services.insert(
            "node".to_string(),
            ServiceDefinition {
                short: "Node.js".to_string(),
                aliases: vec!["npm".to_string()],
                ..ServiceDefinition::new("node:18")
            },
        );
        AliasRegistry::from_services(&services).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
        build_command(&registry()).debug_assert();
    }

    #[test]
    fn test_preparse_stops_at_alias() {
        let cli = Cli::preparse(&args(&["lvm", "-c", "/tmp/lvm.toml", "node", "--config", "x"]));
        assert_eq!(cli.config.as_deref(), Some("/tmp/lvm.toml"));

        let cli = Cli::preparse(&args(&["lvm", "--help"]));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_alias_args_pass_through() {
        let matches = build_command(&registry())
            .try_get_matches_from(args(&["lvm", "-k", "-p", "80:80,443", "npm", "install", "-g", "--help"]))
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert!(cli.keep);
        assert_eq!(cli.ports, vec!["80:80", "443"]);

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "npm");
        assert_eq!(alias_args(sub), vec!["install", "-g", "--help"]);
    }

    #[test]
    fn test_runtime_flags() {
        let matches = build_command(&registry())
            .try_get_matches_from(args(&[
                "lvm", "-d", "-u", "1000", "-t", "20", "--entrypoint", "/bin/sh,-c", "-e", "A=1",
                "-s", "node",
            ]))
            .unwrap();
        let flags = Cli::from_arg_matches(&matches).unwrap().runtime_flags();

        assert!(flags.detached);
        assert_eq!(flags.user.as_deref(), Some("1000"));
        assert_eq!(flags.tag_override(), "20");
        assert_eq!(
            flags.entrypoint_override(),
            Some(&["/bin/sh".to_string(), "-c".to_string()][..])
        );
        assert_eq!(flags.extra_env, vec!["A=1"]);
        assert!(flags.skip_command_name);
        assert!(!flags.keep);
    }

    #[test]
    fn test_env_var_splitting() {
        std::env::set_var("LVM_PORTS", "3000:3000,9229");
        std::env::set_var("LVM_ENVS", "LIST=a,b");
        let matches = build_command(&registry()).try_get_matches_from(args(&["lvm", "node"]));
        std::env::remove_var("LVM_PORTS");
        std::env::remove_var("LVM_ENVS");

        let cli = Cli::from_arg_matches(&matches.unwrap()).unwrap();
        assert_eq!(cli.ports, vec!["3000:3000", "9229"]);
        assert_eq!(cli.envs, vec!["LIST=a,b"]);
    }

    #[test]
    fn test_unknown_alias_rejected() {
        assert!(build_command(&registry())
            .try_get_matches_from(args(&["lvm", "ruby"]))
            .is_err());
    }

    #[test]
    fn test_version_format() {
        let version = version_string();
        assert!(version.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(version.contains(" - build date "));
        assert!(version.contains(" - commit: "));
    }
}
