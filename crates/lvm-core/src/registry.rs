//! Alias registry: every invocable name mapped to its service
//!
//! Each service registers under its own name and under each of its aliases.
//! Entries are kept sorted by name so help output is stable.

use crate::{CoreError, InvocationBuilder, Result, RuntimeFlags};
use lvm_config::{Environment, ServiceDefinition};
use lvm_provider::InvocationSpec;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Names that can never be used as aliases
pub const RESERVED_NAMES: &[&str] = &["help"];

/// One invocable command name
#[derive(Debug, Clone)]
pub struct AliasEntry {
    /// Name typed on the command line
    pub name: String,
    /// Key of the service in the configuration
    pub service_name: String,
    pub service: Arc<ServiceDefinition>,
}

impl AliasEntry {
    /// Whether this entry is an extra name rather than the service key
    pub fn is_alias(&self) -> bool {
        self.name != self.service_name
    }

    /// One-line help: `<short> (<image>)`
    pub fn about(&self) -> String {
        self.service.usage()
    }

    /// Long help: the long description, then the category
    pub fn long_about(&self) -> Option<String> {
        let mut text = self.service.long.trim().to_string();
        if self.is_alias() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&format!("Alias of '{}'.", self.service_name));
        }
        if !self.service.category.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&format!("Category: {}", self.service.category));
        }
        (!text.is_empty()).then_some(text)
    }

    /// Build the invocation spec for this name.
    ///
    /// Creates the mount source directories, so filesystem problems surface
    /// before any runner is contacted.
    pub fn prepare(
        &self,
        env: &Environment,
        flags: &RuntimeFlags,
        args: &[String],
        working_dir: &Path,
    ) -> Result<InvocationSpec> {
        InvocationBuilder::new(env, &self.service, flags).build(
            &self.name,
            &self.service_name,
            args,
            working_dir,
        )
    }
}

/// All registered names, read-only after construction
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    entries: BTreeMap<String, AliasEntry>,
}

impl AliasRegistry {
    /// Register every service under its name and aliases.
    ///
    /// Fails on the first name that is empty, reserved, or already taken.
    pub fn from_services(services: &BTreeMap<String, ServiceDefinition>) -> Result<Self> {
        let mut registry = Self::default();

        for (service_name, definition) in services {
            let service = Arc::new(definition.clone());
            registry.register(service_name, service_name, &service)?;
            for alias in &definition.aliases {
                registry.register(alias, service_name, &service)?;
            }
        }

        tracing::debug!("Registered {} command name(s)", registry.entries.len());
        Ok(registry)
    }

    fn register(
        &mut self,
        name: &str,
        service_name: &str,
        service: &Arc<ServiceDefinition>,
    ) -> Result<()> {
        if name.trim().is_empty() || name.starts_with('-') || RESERVED_NAMES.contains(&name) {
            return Err(CoreError::InvalidAlias {
                name: name.to_string(),
                service: service_name.to_string(),
            });
        }

        if let Some(existing) = self.entries.get(name) {
            return Err(CoreError::DuplicateAlias {
                name: name.to_string(),
                service: service_name.to_string(),
                existing: existing.service_name.clone(),
            });
        }

        self.entries.insert(
            name.to_string(),
            AliasEntry {
                name: name.to_string(),
                service_name: service_name.to_string(),
                service: Arc::clone(service),
            },
        );
        Ok(())
    }

    /// Look up an entry by the name the user typed
    pub fn get(&self, name: &str) -> Option<&AliasEntry> {
        self.entries.get(name)
    }

    /// Entries sorted by name
    pub fn entries(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.values()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockCall, MockRunner};
    use crate::{LifecycleDriver, LifecycleOptions};
    use lvm_provider::NetworkMode;

    fn services(list: &[(&str, ServiceDefinition)]) -> BTreeMap<String, ServiceDefinition> {
        list.iter()
            .map(|(name, def)| (name.to_string(), def.clone()))
            .collect()
    }

    fn with_aliases(image: &str, aliases: &[&str]) -> ServiceDefinition {
        ServiceDefinition {
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            ..ServiceDefinition::new(image)
        }
    }

    #[test]
    fn test_registers_names_and_aliases_sorted() {
        let registry = AliasRegistry::from_services(&services(&[
            ("python", with_aliases("python:3.12", &["py"])),
            ("node", with_aliases("node:18", &["npm", "npx"])),
        ]))
        .unwrap();

        let names: Vec<_> = registry.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["node", "npm", "npx", "py", "python"]);

        let npm = registry.get("npm").unwrap();
        assert_eq!(npm.service_name, "node");
        assert!(npm.is_alias());
        assert!(!registry.get("node").unwrap().is_alias());
        assert!(registry.get("ruby").is_none());
    }

    #[test]
    fn test_rejects_alias_colliding_with_service() {
        let err = AliasRegistry::from_services(&services(&[
            ("node", with_aliases("node", &[])),
            ("yarn", with_aliases("node", &["node"])),
        ]))
        .unwrap_err();

        match err {
            CoreError::DuplicateAlias {
                name,
                service,
                existing,
            } => {
                assert_eq!(name, "node");
                assert_eq!(service, "yarn");
                assert_eq!(existing, "node");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_rejects_alias_shared_between_services() {
        let err = AliasRegistry::from_services(&services(&[
            ("python2", with_aliases("python:2", &["py"])),
            ("python3", with_aliases("python:3", &["py"])),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_rejects_repeated_alias_within_service() {
        let err = AliasRegistry::from_services(&services(&[(
            "node",
            with_aliases("node", &["npm", "npm"]),
        )]))
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_rejects_reserved_and_empty_names() {
        for bad in ["help", "", "--node"] {
            let err =
                AliasRegistry::from_services(&services(&[("node", with_aliases("node", &[bad]))]))
                    .unwrap_err();
            assert!(matches!(err, CoreError::InvalidAlias { .. }), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_help_text() {
        let definition = ServiceDefinition {
            short: "Node.js".to_string(),
            long: "JavaScript runtime".to_string(),
            category: "languages".to_string(),
            aliases: vec!["npm".to_string()],
            ..ServiceDefinition::new("node:18")
        };
        let registry =
            AliasRegistry::from_services(&services(&[("node", definition)])).unwrap();

        let node = registry.get("node").unwrap();
        assert_eq!(node.about(), "Node.js (node:18)");
        assert_eq!(
            node.long_about().as_deref(),
            Some("JavaScript runtime\n\nCategory: languages")
        );

        let npm = registry.get("npm").unwrap();
        assert_eq!(
            npm.long_about().as_deref(),
            Some("JavaScript runtime\n\nAlias of 'node'.\n\nCategory: languages")
        );

        let bare = AliasRegistry::from_services(&services(&[("go", ServiceDefinition::new("golang"))]))
            .unwrap();
        assert_eq!(bare.get("go").unwrap().long_about(), None);
    }

    #[tokio::test]
    async fn test_prepared_spec_reaches_runner() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("home");
        let env = Environment::new("lvm", &home, home.join(".lvm"));
        let definition = ServiceDefinition {
            cache: vec!["/root/.npm".to_string()],
            ..with_aliases("node:18", &["npm"])
        };
        let registry =
            AliasRegistry::from_services(&services(&[("node", definition)])).unwrap();

        let flags = RuntimeFlags {
            ports: vec!["8080:8080".to_string()],
            ..Default::default()
        };
        let args = vec!["install".to_string()];

        let spec = registry
            .get("npm")
            .unwrap()
            .prepare(&env, &flags, &args, tmp.path())
            .unwrap();
        assert_eq!(spec.cmd, vec!["npm", "install"]);
        assert_eq!(spec.network_mode, NetworkMode::Bridge);
        assert_eq!(spec.ports, vec!["8080:8080"]);
        assert!(home.join(".lvm/services/node/18/root/.npm").is_dir());
        assert!(!home.join(".lvm/services/npm").exists());

        let runner = MockRunner::new().with_exit_code(3);
        let outcome = LifecycleDriver::new(&runner)
            .execute(spec, LifecycleOptions::from(&flags))
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, 3);
        assert!(runner.was_called(&MockCall::Create {
            image: "node:18".to_string(),
            cmd: vec!["npm".to_string(), "install".to_string()],
        }));
        assert_eq!(runner.remove_count(), 1);

        let received = runner.last_spec().unwrap();
        assert_eq!(received.network_mode, NetworkMode::Bridge);
        assert_eq!(received.ports, vec!["8080:8080"]);
        assert!(received.stdin_open);
        assert_eq!(received.env[0], format!("HOME={}", env.fake_home().display()));
        let cache = received
            .mounts
            .iter()
            .find(|m| m.target == "/root/.npm")
            .unwrap();
        assert!(cache.source.ends_with("services/node/18/root/.npm"));
    }
}
