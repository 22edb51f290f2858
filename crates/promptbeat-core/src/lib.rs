//! promptbeat Core
//!
//! Tool-calling orchestration for scheduled LLM prompts.
//! This crate lets a model answer a prompt by calling tools exposed by
//! external MCP servers, without the model having a native function-calling
//! API and without the caller knowing tools were involved.
//!
//! ## Tool Orchestration
//!
//! - `tools`: connects to every configured server, merges and filters their
//!   tools, and executes calls with a per-call timeout
//! - `dialects`: teaches the model a textual tool-call convention and parses
//!   its requests back out of free text
//! - `orchestrator`: wraps a provider and drives the bounded
//!   call-model / run-tools loop
//!
//! ```rust,ignore
//! use promptbeat_core::{ToolOrchestrator, ToolsConfig, ServerConfig, Provider};
//!
//! let config = ToolsConfig::with_servers(vec![
//!     ServerConfig::process("fs", "npx")
//!         .with_args(["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]),
//! ]);
//! let orchestrator = ToolOrchestrator::from_config(provider, &config, logger)?;
//!
//! // Same contract as any provider
//! let response = orchestrator.call("What files are in /tmp?").await?;
//! println!("{:?}", response.metadata.tool_calls);
//! ```

pub mod config;
pub mod dialects;
pub mod logging;
pub mod mcp;
pub mod orchestrator;
pub mod providers;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    LlmResponse, ModelPricing, ProviderCapabilities, ResponseMetadata, TokenUsage,
    Tool, ToolArguments, ToolCallRecord, ToolCallRequest, ToolExecutionResult,
};

pub use logging::{ConsoleLogger, Logger, MemoryLogger, NoOpLogger};

pub use config::{ConfigError, ConfigFile, ConfigLoader, ServerConfig, ToolsConfig};

pub use providers::{MockProvider, Provider, ProviderError, ProviderKind, ProviderResult};

pub use mcp::{McpClient, McpError, McpResult, ServerConnector, ToolServerConnection};

pub use tools::{ToolPolicy, ToolRegistryClient};

pub use dialects::{DialectKind, DialectRegistry, ToolCallDialect};

pub use orchestrator::{SessionState, ToolOrchestrator};
