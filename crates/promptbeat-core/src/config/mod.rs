//! Tool-calling configuration
//!
//! Supports two configuration sources:
//! - In code: build a [`ToolsConfig`] directly
//! - File-based: YAML at user level (`~/.config/promptbeat/config.yaml`) or
//!   workspace level (`.promptbeat/config.yaml`)

mod error;
mod file;
mod tools;

pub use error::{ConfigError, ConfigResult};
pub use file::{expand_env_vars, ConfigFile, ConfigLevel, ConfigLoader};
pub use tools::{validate_servers, ServerConfig, ToolsConfig, TransportKind};
