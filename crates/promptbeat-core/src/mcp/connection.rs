//! Connection traits shared by every transport

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::types::{Tool, ToolArguments};

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn server process: {0}")]
    SpawnFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed")]
    Closed,
}

pub type McpResult<T> = Result<T, McpError>;

/// A live connection to one tool server
#[async_trait]
pub trait ToolServerConnection: Send + Sync {
    /// Fetch the server's tool catalog
    async fn list_tools(&self) -> McpResult<Vec<Tool>>;

    /// Invoke a tool and return its payload
    ///
    /// A tool that reports failure is an `Err(McpError::ToolCallFailed)`.
    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> McpResult<Value>;

    /// Shut the connection down; later calls fail with `McpError::Closed`
    async fn close(&self) -> McpResult<()>;
}

/// Type alias for an Arc-wrapped connection
pub type SharedConnection = Arc<dyn ToolServerConnection>;

/// Opens connections for configured servers
#[async_trait]
pub trait ServerConnector: Send + Sync {
    /// Spawn/reach the server and complete the protocol handshake
    async fn connect(&self, server: &ServerConfig) -> McpResult<SharedConnection>;
}
