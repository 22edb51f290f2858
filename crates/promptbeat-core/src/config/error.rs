//! Configuration errors

/// Errors that can occur while loading or validating configuration
///
/// These are setup defects: they surface at construction time, never
/// from a call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Server name must not be empty")]
    EmptyServerName,

    #[error("Duplicate server name: {0}")]
    DuplicateServer(String),

    #[error("Server '{0}' uses the process transport but has no command")]
    MissingCommand(String),

    #[error("Tool timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Tool calling is enabled but no servers are configured")]
    NoServers,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
