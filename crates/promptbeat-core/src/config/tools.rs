//! Tool server and tool-calling settings

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::dialects::DialectKind;
use crate::tools::ToolPolicy;

/// How a tool server is reached
///
/// Only spawned processes are supported; network transports would be new
/// variants here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Spawn a subprocess and speak MCP over its stdin/stdout
    #[default]
    Process,
}

/// One configured tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique server name
    pub name: String,
    /// Transport used to reach the server
    #[serde(default)]
    pub transport: TransportKind,
    /// Executable to spawn
    #[serde(default)]
    pub command: String,
    /// Command line arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory for the child process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl ServerConfig {
    /// Create a process server configuration
    pub fn process(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Process,
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Set the command line arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Check required fields for the configured transport
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyServerName);
        }
        match self.transport {
            TransportKind::Process if self.command.trim().is_empty() => {
                Err(ConfigError::MissingCommand(self.name.clone()))
            }
            TransportKind::Process => Ok(()),
        }
    }
}

/// Validate a server list: every entry valid, names unique
pub fn validate_servers(servers: &[ServerConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for server in servers {
        server.validate()?;
        if !seen.insert(server.name.as_str()) {
            return Err(ConfigError::DuplicateServer(server.name.clone()));
        }
    }
    Ok(())
}

fn default_max_tool_calls() -> usize {
    5
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Tool-calling settings for one orchestrated provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Whether tool calling is requested at all
    #[serde(default)]
    pub enabled: bool,
    /// Maximum tool executions per top-level call
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: usize,
    /// Timeout for a single tool execution, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Explicit dialect override; resolved from the provider when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<DialectKind>,
    /// If set and non-empty, only these tools are exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_list: Option<Vec<String>>,
    /// Tools never exposed; wins over the allow list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_list: Option<Vec<String>>,
    /// Tool servers to connect to
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_tool_calls: default_max_tool_calls(),
            timeout_ms: default_timeout_ms(),
            dialect: None,
            allow_list: None,
            block_list: None,
            servers: Vec::new(),
        }
    }
}

impl ToolsConfig {
    /// Enabled configuration for the given servers
    pub fn with_servers(servers: Vec<ServerConfig>) -> Self {
        Self {
            enabled: true,
            servers,
            ..Default::default()
        }
    }

    pub fn with_max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_allow_list(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.allow_list = Some(names.into_iter().collect());
        self
    }

    pub fn with_block_list(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.block_list = Some(names.into_iter().collect());
        self
    }

    /// Per-execution timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Allow/block policy described by this configuration
    pub fn policy(&self) -> ToolPolicy {
        ToolPolicy::new(self.allow_list.clone(), self.block_list.clone())
    }

    /// Check the settings the registry client depends on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        validate_servers(&self.servers)
    }
}
