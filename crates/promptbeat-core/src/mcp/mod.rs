//! MCP (Model Context Protocol) transport boundary
//!
//! A tool server is anything that can list its tools, run one, and be
//! closed. [`ServerConnector`] turns a [`ServerConfig`](crate::config::ServerConfig)
//! into a live [`ToolServerConnection`].
//!
//! Implementations:
//! - [`ProcessConnector`] / [`McpClient`]: spawns the server as a child process
//!   and speaks MCP over its stdin/stdout using the official rmcp SDK
//! - [`MemoryConnector`] / [`MemoryToolServer`]: in-process servers for testing
//!
//! # Example
//!
//! ```rust,ignore
//! use promptbeat_core::config::ServerConfig;
//! use promptbeat_core::mcp::McpClient;
//!
//! let server = ServerConfig::process("git", "uvx").with_args(["mcp-server-git"]);
//! let client = McpClient::spawn(&server, logger).await?;
//!
//! let tools = client.list_tools().await?;
//! let status = client.call_tool("git_status", args).await?;
//! client.close().await?;
//! ```

mod client;
mod connection;
mod memory;

pub use client::{McpClient, ProcessConnector};
pub use connection::{McpError, McpResult, ServerConnector, SharedConnection, ToolServerConnection};
pub use memory::{MemoryConnector, MemoryToolServer, ToolHandler};
