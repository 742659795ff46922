//! Invocation building: service definition + flags + cwd → container spec

use crate::{resolve_image, resolve_tag, CoreError, Result, RuntimeFlags};
use lvm_config::{Environment, ServiceDefinition};
use lvm_provider::{InvocationSpec, MountConfig, NetworkMode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Label marking containers created by lvm
pub const MANAGED_LABEL: &str = "lvm.managed";
/// Label holding the alias a container was started for
pub const ALIAS_LABEL: &str = "lvm.alias";
/// Label holding the service key the alias belongs to
pub const SERVICE_LABEL: &str = "lvm.service";

/// Derives the container invocation for one service
#[derive(Debug, Clone, Copy)]
pub struct InvocationBuilder<'a> {
    env: &'a Environment,
    service: &'a ServiceDefinition,
    flags: &'a RuntimeFlags,
}

impl<'a> InvocationBuilder<'a> {
    pub fn new(
        env: &'a Environment,
        service: &'a ServiceDefinition,
        flags: &'a RuntimeFlags,
    ) -> Self {
        Self { env, service, flags }
    }

    /// Effective image reference
    pub fn image(&self) -> String {
        resolve_image(&self.service.image, self.flags.tag_override())
    }

    /// Effective image tag
    pub fn tag(&self) -> String {
        resolve_tag(&self.service.image, self.flags.tag_override())
    }

    /// Command argv for the container.
    ///
    /// With a pre-command the user command becomes the second line of a
    /// `sh -c` script, so state set up by the pre-command is visible to it.
    pub fn command(&self, alias: &str, args: &[String]) -> Vec<String> {
        let mut command = Vec::with_capacity(args.len() + 1);
        if !self.flags.skip_command_name {
            command.push(alias.to_string());
        }
        command.extend(args.iter().cloned());

        match self.service.pre_command() {
            Some(pre) => vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("{}\n{}", pre, command.join(" ")),
            ],
            None => command,
        }
    }

    /// Host directory backing one cache path:
    /// `<cache root>/services/<service>/<tag>/<cache path>`
    ///
    /// Keyed by service, so every alias of a service shares its caches.
    pub fn cache_dir(&self, service_name: &str, tag: &str, cache_path: &str) -> PathBuf {
        self.env
            .services_dir()
            .join(service_name)
            .join(tag)
            .join(cache_path.trim_start_matches('/'))
    }

    /// Bind mounts: real home, fake home, then one per cache path
    pub fn mounts(&self, service_name: &str, tag: &str) -> Vec<MountConfig> {
        let home = path_string(self.env.home_dir());
        let fake_home = path_string(&self.env.fake_home());

        let mut mounts = vec![
            MountConfig::bind(home.clone(), home),
            MountConfig::bind(fake_home.clone(), fake_home),
        ];

        for cache in &self.service.cache {
            let source = self.cache_dir(service_name, tag, cache);
            mounts.push(MountConfig::bind(path_string(&source), cache.clone()));
        }

        mounts
    }

    /// `HOME`, then service defaults, then per-invocation extras.
    /// Duplicate keys are left for the runtime to resolve (last wins).
    pub fn environment(&self) -> Vec<String> {
        let mut env = Vec::with_capacity(1 + self.service.env.len() + self.flags.extra_env.len());
        env.push(format!("HOME={}", path_string(&self.env.fake_home())));
        env.extend(self.service.env.iter().cloned());
        env.extend(self.flags.extra_env.iter().cloned());
        env
    }

    /// Flag override, then service override, then the image default
    pub fn entrypoint(&self) -> Option<Vec<String>> {
        self.flags
            .entrypoint_override()
            .or_else(|| self.service.entrypoint_override())
            .map(|e| e.to_vec())
    }

    /// Host networking unless ports are requested
    pub fn network(&self) -> (NetworkMode, Vec<String>) {
        if self.flags.ports.is_empty() {
            (NetworkMode::Host, Vec::new())
        } else {
            (NetworkMode::Bridge, self.flags.ports.clone())
        }
    }

    /// Build the full spec and create every mount source on the host.
    ///
    /// `alias` is the name the user typed and becomes the first command
    /// word. `service_name` is the service key and selects the cache dirs.
    /// Stdin stays open for every attached run. A TTY is only allocated
    /// when the host stdin is a terminal.
    pub fn build(
        &self,
        alias: &str,
        service_name: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<InvocationSpec> {
        let tag = self.tag();
        let mounts = self.mounts(service_name, &tag);
        ensure_mount_sources(&mounts)?;

        let (network_mode, ports) = self.network();
        let attached = !self.flags.detached;

        let mut labels = BTreeMap::new();
        labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
        labels.insert(ALIAS_LABEL.to_string(), alias.to_string());
        labels.insert(SERVICE_LABEL.to_string(), service_name.to_string());

        let spec = InvocationSpec {
            name: Some(container_name(self.env.app_name(), alias)),
            image: self.image(),
            tag,
            cmd: self.command(alias, args),
            entrypoint: self.entrypoint(),
            env: self.environment(),
            working_dir: Some(path_string(working_dir)),
            user: self.flags.user.clone().filter(|u| !u.is_empty()),
            mounts,
            network_mode,
            ports,
            labels,
            tty: attached && self.flags.tty,
            stdin_open: attached,
            auto_remove: self.flags.detached && !self.flags.keep,
        };

        tracing::debug!(
            "Invocation for '{}': image={}, cmd={:?}, network={}",
            alias,
            spec.image,
            spec.cmd,
            spec.network_mode
        );

        Ok(spec)
    }
}

/// Create every mount source directory (`mkdir -p`)
pub fn ensure_mount_sources(mounts: &[MountConfig]) -> Result<()> {
    for mount in mounts {
        std::fs::create_dir_all(&mount.source).map_err(|e| CoreError::CreateDir {
            path: PathBuf::from(&mount.source),
            source: e,
        })?;
    }
    Ok(())
}

/// `<app>_<alias>_<8 hex chars>`, restricted to characters Docker accepts
pub fn container_name(app_name: &str, alias: &str) -> String {
    let sanitized: String = alias
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", app_name, sanitized, &suffix[..8])
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
