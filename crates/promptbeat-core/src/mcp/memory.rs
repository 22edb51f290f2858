//! In-memory tool servers for testing
//!
//! Mirrors the process transport without spawning anything: tools are
//! closures, latency and failures are configurable, and every server keeps
//! counters so tests can check that each connection was closed exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::connection::{McpError, McpResult, ServerConnector, SharedConnection, ToolServerConnection};
use crate::config::ServerConfig;
use crate::types::{Tool, ToolArguments};

/// A tool implementation: arguments in, payload or error message out
pub type ToolHandler = Arc<dyn Fn(ToolArguments) -> Result<Value, String> + Send + Sync>;

#[derive(Clone)]
struct MemoryTool {
    tool: Tool,
    delay: Duration,
    handler: ToolHandler,
}

#[derive(Default)]
struct ServerStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

/// An in-process tool server
///
/// Clones share their counters, so a test can keep one handle and give
/// another to a [`MemoryConnector`].
#[derive(Clone, Default)]
pub struct MemoryToolServer {
    tools: Vec<MemoryTool>,
    catalog_error: Option<String>,
    close_error: Option<String>,
    connect_delay: Duration,
    stats: Arc<ServerStats>,
}

impl MemoryToolServer {
    /// Create a server with no tools
    pub fn new() -> Self {
        Self::default()
    }

    /// A server exposing `echo(text)`, which returns `text` unchanged
    pub fn echo() -> Self {
        let tool = Tool::new("echo", "Echo the given text back").with_schema(serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        }));
        Self::new().with_tool(tool, |args| {
            args.get("text")
                .cloned()
                .ok_or_else(|| "missing argument: text".to_string())
        })
    }

    /// Add a tool that answers immediately
    pub fn with_tool<F>(self, tool: Tool, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.with_delayed_tool(tool, Duration::ZERO, handler)
    }

    /// Add a tool that sleeps for `delay` before answering
    pub fn with_delayed_tool<F>(mut self, tool: Tool, delay: Duration, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.tools.push(MemoryTool {
            tool,
            delay,
            handler: Arc::new(handler),
        });
        self
    }

    /// Make `list_tools` fail
    pub fn with_catalog_error(mut self, message: impl Into<String>) -> Self {
        self.catalog_error = Some(message.into());
        self
    }

    /// Make `close` fail (the connection is still marked closed)
    pub fn with_close_error(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    /// Delay the handshake
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Number of connections opened so far
    pub fn connections_opened(&self) -> usize {
        self.stats.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far
    pub fn connections_closed(&self) -> usize {
        self.stats.closed.load(Ordering::SeqCst)
    }

    /// Names of the tools invoked so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.stats.calls.lock().clone()
    }
}

struct MemoryConnection {
    server: MemoryToolServer,
    closed: AtomicBool,
}

#[async_trait]
impl ToolServerConnection for MemoryConnection {
    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::Closed);
        }
        if let Some(message) = &self.server.catalog_error {
            return Err(McpError::Protocol(message.clone()));
        }
        Ok(self.server.tools.iter().map(|t| t.tool.clone()).collect())
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> McpResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::Closed);
        }
        let tool = self
            .server
            .tools
            .iter()
            .find(|t| t.tool.name == name)
            .ok_or_else(|| McpError::ToolCallFailed(format!("unknown tool: {}", name)))?;

        self.server.stats.calls.lock().push(name.to_string());
        if !tool.delay.is_zero() {
            tokio::time::sleep(tool.delay).await;
        }
        (tool.handler)(arguments).map_err(McpError::ToolCallFailed)
    }

    async fn close(&self) -> McpResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.server.stats.closed.fetch_add(1, Ordering::SeqCst);
        match &self.server.close_error {
            Some(message) => Err(McpError::Protocol(message.clone())),
            None => Ok(()),
        }
    }
}

enum Endpoint {
    Server(MemoryToolServer),
    Unreachable(String),
}

/// Connector resolving server names to in-memory servers
#[derive(Default)]
pub struct MemoryConnector {
    endpoints: HashMap<String, Endpoint>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `name` with `server`
    pub fn with_server(mut self, name: impl Into<String>, server: MemoryToolServer) -> Self {
        self.endpoints.insert(name.into(), Endpoint::Server(server));
        self
    }

    /// Make connecting to `name` fail as if the process could not be spawned
    pub fn with_unreachable(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), Endpoint::Unreachable(reason.into()));
        self
    }
}

#[async_trait]
impl ServerConnector for MemoryConnector {
    async fn connect(&self, server: &ServerConfig) -> McpResult<SharedConnection> {
        match self.endpoints.get(&server.name) {
            Some(Endpoint::Server(memory)) => {
                if !memory.connect_delay.is_zero() {
                    tokio::time::sleep(memory.connect_delay).await;
                }
                memory.stats.opened.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(MemoryConnection {
                    server: memory.clone(),
                    closed: AtomicBool::new(false),
                }))
            }
            Some(Endpoint::Unreachable(reason)) => Err(McpError::SpawnFailed(reason.clone())),
            None => Err(McpError::SpawnFailed(format!(
                "no in-memory server named '{}'",
                server.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_echo_server() {
        let server = MemoryToolServer::echo();
        let connector = MemoryConnector::new().with_server("local", server.clone());
        let conn = connector
            .connect(&ServerConfig::process("local", "unused"))
            .await
            .unwrap();

        let tools = conn.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");

        let payload = conn.call_tool("echo", args(json!({ "text": "hi" }))).await.unwrap();
        assert_eq!(payload, json!("hi"));

        let err = conn.call_tool("echo", ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, McpError::ToolCallFailed(_)));

        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert_eq!(server.connections_opened(), 1);
        assert_eq!(server.connections_closed(), 1);
        assert_eq!(server.calls(), vec!["echo", "echo"]);
        assert!(matches!(conn.list_tools().await, Err(McpError::Closed)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let connector = MemoryConnector::new().with_unreachable("down", "spawn failed");
        let result = connector.connect(&ServerConfig::process("down", "x")).await;
        assert!(matches!(result, Err(McpError::SpawnFailed(ref m)) if m == "spawn failed"));

        let missing = connector.connect(&ServerConfig::process("other", "x")).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_failure_knobs() {
        let server = MemoryToolServer::new()
            .with_catalog_error("tools/list not supported")
            .with_close_error("broken pipe");
        let connector = MemoryConnector::new().with_server("flaky", server.clone());
        let conn = connector.connect(&ServerConfig::process("flaky", "x")).await.unwrap();

        assert!(matches!(conn.list_tools().await, Err(McpError::Protocol(_))));
        assert!(conn.close().await.is_err());
        assert_eq!(server.connections_closed(), 1);
    }
}
