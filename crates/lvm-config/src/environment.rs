//! Process-wide paths, resolved once at startup and passed by reference

use crate::{ConfigError, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Application name; used for the cache folder and config file names
pub const APP_NAME: &str = "lvm";

/// Immutable view of the host paths lvm works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    app_name: String,
    home_dir: PathBuf,
    cache_root: PathBuf,
}

impl Environment {
    pub fn new(
        app_name: impl Into<String>,
        home_dir: impl Into<PathBuf>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            home_dir: home_dir.into(),
            cache_root: cache_root.into(),
        }
    }

    /// Detect the host home directory.
    ///
    /// The cache root defaults to `<home>/.<app>` unless `cache_override` is
    /// given, in which case `~` is expanded.
    pub fn detect(app_name: &str, cache_override: Option<&str>) -> Result<Self> {
        let home_dir = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or(ConfigError::NoHomeDir)?;

        let cache_root = match cache_override {
            Some(path) if !path.is_empty() => expand_path(path),
            _ => default_cache_root(&home_dir, app_name),
        };

        tracing::debug!(
            "Environment: home={}, cache={}",
            home_dir.display(),
            cache_root.display()
        );

        Ok(Self::new(app_name, home_dir, cache_root))
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Real home directory of the host user
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Root of all lvm-managed directories
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Directory substituted for `HOME` inside containers
    pub fn fake_home(&self) -> PathBuf {
        self.cache_root.join("home")
    }

    /// Parent of all per-service cache directories
    pub fn services_dir(&self) -> PathBuf {
        self.cache_root.join("services")
    }
}

/// `<home>/.<app>`
pub fn default_cache_root(home_dir: &Path, app_name: &str) -> PathBuf {
    home_dir.join(format!(".{}", app_name))
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let env = Environment::new("lvm", "/home/dev", "/home/dev/.lvm");
        assert_eq!(env.app_name(), "lvm");
        assert_eq!(env.fake_home(), PathBuf::from("/home/dev/.lvm/home"));
        assert_eq!(env.services_dir(), PathBuf::from("/home/dev/.lvm/services"));
    }

    #[test]
    fn test_default_cache_root() {
        assert_eq!(
            default_cache_root(Path::new("/home/dev"), "lvm"),
            PathBuf::from("/home/dev/.lvm")
        );
    }

    #[test]
    fn test_detect_with_override() {
        let env = Environment::detect("lvm", Some("/var/cache/lvm")).unwrap();
        assert_eq!(env.cache_root(), Path::new("/var/cache/lvm"));
    }

    #[test]
    fn test_detect_empty_override_uses_default() {
        let env = Environment::detect("lvm", Some("")).unwrap();
        assert_eq!(env.cache_root(), env.home_dir().join(".lvm"));
    }
}
