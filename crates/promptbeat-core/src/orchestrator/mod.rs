//! Tool-calling orchestration
//!
//! [`ToolOrchestrator`] wraps any [`Provider`](crate::providers::Provider)
//! and is itself a `Provider`, so it drops in wherever a bare provider is
//! used. Each `call()`:
//!
//! 1. connects the tool servers
//! 2. calls the provider directly if no tools are available
//! 3. otherwise teaches the model the dialect, then loops: call the model,
//!    extract tool calls, run them concurrently, feed the results back
//! 4. stops when the model answers without tool calls or the tool-call
//!    budget is spent
//! 5. disconnects, on success and on provider errors alike
//!
//! # Example
//!
//! ```rust,ignore
//! use promptbeat_core::config::ConfigLoader;
//! use promptbeat_core::orchestrator::ToolOrchestrator;
//!
//! let config = ConfigLoader::workspace(".").load()?;
//! let orchestrator = ToolOrchestrator::from_config(provider, &config.tools, logger)?;
//!
//! let response = orchestrator.call("Summarize the open issues").await?;
//! for record in response.metadata.tool_calls.unwrap_or_default() {
//!     println!("{} -> {}", record.tool, record.success);
//! }
//! ```

mod session;
mod tool_orchestrator;

pub use session::SessionState;
pub use tool_orchestrator::ToolOrchestrator;
