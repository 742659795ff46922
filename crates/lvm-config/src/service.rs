//! Service definitions: how one alias maps onto a container image

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Declarative description of how to containerize one tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDefinition {
    /// Image in `repository[:tag]` form
    pub image: String,
    /// One-line description shown in help
    pub short: String,
    /// Long description shown in the alias' own help
    pub long: String,
    /// Additional names this service can be invoked by
    pub aliases: Vec<String>,
    /// Service default environment, `KEY=VALUE`
    pub env: Vec<String>,
    /// Absolute in-container paths persisted across invocations
    pub cache: Vec<String>,
    /// Shell snippet run before the user command in the same shell
    #[serde(rename = "preCmd", alias = "pre_cmd", skip_serializing_if = "Option::is_none")]
    pub pre_cmd: Option<String>,
    /// Replaces the image's default entrypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Grouping label for help display
    pub category: String,
}

impl ServiceDefinition {
    /// Create a definition for an image with everything else defaulted
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Pre-command, treating an empty string as unset
    pub fn pre_command(&self) -> Option<&str> {
        self.pre_cmd.as_deref().filter(|s| !s.is_empty())
    }

    /// Entrypoint override, treating an empty list as unset
    pub fn entrypoint_override(&self) -> Option<&[String]> {
        self.entrypoint.as_deref().filter(|e| !e.is_empty())
    }

    /// Summary used for the alias' entry in help output
    pub fn usage(&self) -> String {
        if self.short.is_empty() {
            format!("({})", self.image)
        } else {
            format!("{} ({})", self.short, self.image)
        }
    }

    /// Check the definition is usable
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        if let Some(path) = self.cache.iter().find(|p| !p.starts_with('/')) {
            return Err(format!("cache path '{}' must be absolute", path));
        }
        // Cache dirs are joined under the cache root on the host
        if let Some(path) = self
            .cache
            .iter()
            .find(|p| Path::new(p).components().any(|c| c == Component::ParentDir))
        {
            return Err(format!("cache path '{}' must not contain '..'", path));
        }
        Ok(())
    }
}
