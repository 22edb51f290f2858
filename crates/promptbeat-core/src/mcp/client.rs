//! MCP client using the official rmcp SDK
//!
//! Spawns a tool server as a child process and talks to it over stdio.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent,
    },
    service::{Peer, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use tokio::process::Command;

use super::connection::{McpError, McpResult, ServerConnector, SharedConnection, ToolServerConnection};
use crate::config::{ServerConfig, TransportKind};
use crate::logging::Logger;
use crate::types::{Tool, ToolArguments};

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "promptbeat-core".to_string(),
            title: Some("promptbeat".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// MCP client for one tool server running as a child process
pub struct McpClient {
    server_name: String,
    /// Request handle, cloneable so concurrent calls don't contend
    peer: Peer<RoleClient>,
    /// The running service; taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Spawn the configured process and perform the MCP handshake
    pub async fn spawn(server: &ServerConfig, logger: Arc<dyn Logger>) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Spawning '{}': {} {:?}",
            server.name, server.command, server.args
        ));

        let command = Command::new(&server.command).configure(|cmd| {
            cmd.args(&server.args)
                .envs(&server.env)
                .stderr(Stdio::inherit());
            if let Some(cwd) = &server.cwd {
                cmd.current_dir(cwd);
            }
        });

        let transport = TokioChildProcess::new(command).map_err(|e| {
            McpError::SpawnFailed(format!("'{}' ({}): {}", server.name, server.command, e))
        })?;

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(format!("'{}': {}", server.name, e)))?;

        logger.info(&format!("[McpClient] '{}' connected and initialized", server.name));

        Ok(Self {
            server_name: server.name.clone(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            logger,
        })
    }

    /// Name of the server this client talks to
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Get server info reported during the handshake
    pub fn server_info(&self) -> Option<Implementation> {
        self.peer.peer_info().map(|info| info.server_info.clone())
    }
}

/// Turn an MCP tool result into a payload
///
/// Structured content wins over text; text items are joined with newlines.
/// A result the server flags as an error becomes `McpError::ToolCallFailed`.
pub(crate) fn payload_from_result(result: CallToolResult) -> McpResult<Value> {
    // Content is Annotated<RawContent>, we access .raw to get RawContent
    let text = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        let message = if text.is_empty() {
            "tool reported an error".to_string()
        } else {
            text
        };
        return Err(McpError::ToolCallFailed(message));
    }

    Ok(result.structured_content.unwrap_or(Value::String(text)))
}

#[async_trait]
impl ToolServerConnection for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] '{}' listed {} tools",
            self.server_name,
            tools.len()
        ));

        Ok(tools
            .into_iter()
            .map(|tool| Tool {
                name: tool.name.to_string(),
                description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
                input_schema: Value::Object(tool.input_schema.as_ref().clone()),
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> McpResult<Value> {
        if self.service.lock().is_none() {
            return Err(McpError::Closed);
        }

        self.logger
            .debug(&format!("[McpClient] '{}' calling tool: {}", self.server_name, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        payload_from_result(result)
    }

    async fn close(&self) -> McpResult<()> {
        let service = self.service.lock().take();
        let Some(service) = service else {
            return Ok(());
        };

        self.logger
            .info(&format!("[McpClient] Closing connection to '{}'", self.server_name));
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

/// Connector that spawns every server as a child process
pub struct ProcessConnector {
    logger: Arc<dyn Logger>,
}

impl ProcessConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl ServerConnector for ProcessConnector {
    async fn connect(&self, server: &ServerConfig) -> McpResult<SharedConnection> {
        match server.transport {
            TransportKind::Process => {
                let client = McpClient::spawn(server, Arc::clone(&self.logger)).await?;
                Ok(Arc::new(client))
            }
        }
    }
}
