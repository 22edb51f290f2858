//! File-based configuration (YAML)
//!
//! Supports user-level (~/.config/promptbeat/config.yaml) and workspace-level
//! (.promptbeat/config.yaml) config.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::error::ConfigResult;
use super::tools::ToolsConfig;

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid"));

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Tool-calling settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl ConfigFile {
    /// Parse YAML, expand `${VAR}` references and validate
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Self::from_yaml_str_with(content, |key| std::env::var(key).ok())
    }

    /// Same as [`ConfigFile::from_yaml_str`] with a custom variable lookup
    pub fn from_yaml_str_with<F>(content: &str, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: ConfigFile = serde_yaml::from_str(content)?;
        for server in &mut config.tools.servers {
            for arg in &mut server.args {
                *arg = expand_env_vars(arg, &lookup);
            }
            for value in server.env.values_mut() {
                *value = expand_env_vars(value, &lookup);
            }
            if let Some(cwd) = server.cwd.take() {
                server.cwd = Some(PathBuf::from(expand_env_vars(&cwd.to_string_lossy(), &lookup)));
            }
        }
        config.tools.validate()?;
        Ok(config)
    }
}

/// Replace every `${NAME}` in `input` with `lookup(NAME)`, or "" when unset
pub fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR
        .replace_all(input, |caps: &Captures<'_>| lookup(&caps[1]).unwrap_or_default())
        .into_owned()
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/promptbeat/config.yaml)
    User,
    /// Workspace-level config (.promptbeat/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// Loads and saves a [`ConfigFile`] at a fixed path
///
/// # Example
///
/// ```no_run
/// use promptbeat_core::config::ConfigLoader;
///
/// let config = ConfigLoader::workspace("/path/to/workspace").load()?;
/// println!("{} tool servers", config.tools.servers.len());
/// # Ok::<(), promptbeat_core::config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    level: ConfigLevel,
}

impl ConfigLoader {
    /// Create a loader for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
        }
    }

    /// User-level config (~/.config/promptbeat/config.yaml)
    pub fn user() -> Self {
        // Use XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("promptbeat").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level config (.promptbeat/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".promptbeat").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load config from file; a missing file yields the default config
    pub fn load(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        ConfigFile::from_yaml_str(&content)
    }

    /// Save config to file
    pub fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(config)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, ServerConfig, TransportKind};
    use crate::dialects::DialectKind;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
tools:
  enabled: true
  max_tool_calls: 3
  timeout_ms: 5000
  dialect: anthropic-invoke
  allow_list: [read_file, list_dir]
  block_list: [delete_file]
  servers:
    - name: filesystem
      transport: process
      command: npx
      args: ["-y", "@modelcontextprotocol/server-filesystem", "${WORKDIR}"]
      env:
        TOKEN: "${API_TOKEN}"
        MISSING: "x${NOT_SET}y"
      cwd: "${WORKDIR}/sub"
"#;

    fn lookup(key: &str) -> Option<String> {
        match key {
            "WORKDIR" => Some("/srv/data".to_string()),
            "API_TOKEN" => Some("secret".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_parse_sample() {
        let config = ConfigFile::from_yaml_str_with(SAMPLE, lookup).unwrap();
        let tools = &config.tools;

        assert!(tools.enabled);
        assert_eq!(tools.max_tool_calls, 3);
        assert_eq!(tools.timeout_ms, 5000);
        assert_eq!(tools.dialect, Some(DialectKind::AnthropicInvoke));
        assert_eq!(tools.block_list.as_deref(), Some(&["delete_file".to_string()][..]));

        let server = &tools.servers[0];
        assert_eq!(server.transport, TransportKind::Process);
        assert_eq!(server.args[2], "/srv/data");
        assert_eq!(server.env["TOKEN"], "secret");
        assert_eq!(server.env["MISSING"], "xy");
        assert_eq!(server.cwd.as_deref(), Some(Path::new("/srv/data/sub")));
    }

    #[test]
    fn test_every_dialect_name_loads() {
        for (name, kind) in [
            ("xml-tags", DialectKind::XmlTags),
            ("anthropic-invoke", DialectKind::AnthropicInvoke),
            ("openai-json", DialectKind::OpenAiJson),
        ] {
            let yaml = format!("tools:\n  dialect: {}\n", name);
            let config = ConfigFile::from_yaml_str_with(&yaml, lookup).unwrap();
            assert_eq!(config.tools.dialect, Some(kind));

            let saved = serde_yaml::to_string(&config).unwrap();
            assert!(saved.contains(&format!("dialect: {}", name)), "{}", saved);
        }
    }

    #[test]
    fn test_missing_command_fails_fast() {
        let yaml = "tools:\n  servers:\n    - name: broken\n";
        let err = ConfigFile::from_yaml_str_with(yaml, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCommand(name) if name == "broken"));
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let yaml = "tools:\n  servers:\n    - name: web\n      transport: http\n      command: x\n";
        assert!(matches!(
            ConfigFile::from_yaml_str_with(yaml, lookup),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_expand_env_vars() {
        assert_eq!(expand_env_vars("${WORKDIR}/a/${WORKDIR}", lookup), "/srv/data/a//srv/data");
        assert_eq!(expand_env_vars("no vars", lookup), "no vars");
        assert_eq!(expand_env_vars("$WORKDIR", lookup), "$WORKDIR");
    }

    #[test]
    fn test_loader_roundtrip() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::workspace(dir.path());

        // Missing file is the default config
        assert!(!loader.exists());
        assert_eq!(loader.load().unwrap(), ConfigFile::default());

        let config = ConfigFile {
            tools: ToolsConfig::with_servers(vec![
                ServerConfig::process("echo", "echo-server").with_args(["--stdio"]),
            ]),
        };
        loader.save(&config).unwrap();

        assert!(loader.exists());
        assert_eq!(loader.level(), ConfigLevel::Workspace);
        assert_eq!(loader.load().unwrap(), config);
    }
}
