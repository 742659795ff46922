//! Per-invocation runtime flags

/// Flags parsed once per process, shared by every alias
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeFlags {
    /// Return right after the container starts
    pub detached: bool,
    /// `name|uid[:group|gid]`; `None` keeps the image default
    pub user: Option<String>,
    /// Image tag override
    pub tag: Option<String>,
    /// Entrypoint override; wins over the service's own override
    pub entrypoint: Option<Vec<String>>,
    /// `host:container` or `container` port specs; switch to bridge networking
    pub ports: Vec<String>,
    /// Skip container removal after the run
    pub keep: bool,
    /// Extra `KEY=VALUE` entries, applied after the service defaults
    pub extra_env: Vec<String>,
    /// Leave the invoked alias name out of the container command
    pub skip_command_name: bool,
    /// Attach a TTY and forward stdin
    pub tty: bool,
}

impl RuntimeFlags {
    /// Tag override, treating an empty string as unset
    pub fn tag_override(&self) -> &str {
        self.tag.as_deref().unwrap_or_default()
    }

    /// Entrypoint override, treating an empty list as unset
    pub fn entrypoint_override(&self) -> Option<&[String]> {
        self.entrypoint.as_deref().filter(|e| !e.is_empty())
    }
}
