//! Tool registry client
//!
//! The ToolRegistryClient is the central component for:
//! - Connecting to every configured tool server
//! - Discovering and filtering their tools into one catalog
//! - Routing tool executions to the server that owns the tool
//! - Turning every expected failure into a failed `ToolExecutionResult`
//!
//! Nothing here returns an error for tool-not-found, timeouts or dead
//! servers; only invalid configuration fails, and only at construction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::policy::ToolPolicy;
use crate::config::{ConfigResult, ServerConfig, ToolsConfig};
use crate::logging::Logger;
use crate::mcp::{McpResult, ProcessConnector, ServerConnector, SharedConnection};
use crate::types::{Tool, ToolArguments, ToolCallRequest, ToolExecutionResult};

/// Live connections and the catalog built from them
#[derive(Default)]
struct RegistryState {
    connected: bool,
    connections: HashMap<String, SharedConnection>,
    /// Connected server names in registration order
    server_order: Vec<String>,
    /// Allowed tools in registration order
    tools: Vec<Tool>,
    /// Tool name -> name of the server that serves it
    routes: HashMap<String, String>,
}

impl RegistryState {
    fn register(
        &mut self,
        server: &str,
        connection: SharedConnection,
        tools: Vec<Tool>,
        policy: &ToolPolicy,
        logger: &dyn Logger,
    ) -> usize {
        let mut registered = 0;
        for tool in tools {
            if !policy.is_allowed(&tool.name) {
                logger.debug(&format!(
                    "[ToolRegistryClient] Tool '{}' from '{}' filtered out by policy",
                    tool.name, server
                ));
                continue;
            }

            // Last registered wins for duplicate names
            if let Some(previous) = self.routes.insert(tool.name.clone(), server.to_string()) {
                logger.warn(&format!(
                    "[ToolRegistryClient] Tool '{}' from server '{}' replaces the one from server '{}'",
                    tool.name, server, previous
                ));
                self.tools.retain(|t| t.name != tool.name);
            }
            self.tools.push(tool);
            registered += 1;
        }

        self.connections.insert(server.to_string(), connection);
        self.server_order.push(server.to_string());
        registered
    }
}

/// Client for all configured tool servers
pub struct ToolRegistryClient {
    servers: Vec<ServerConfig>,
    policy: ToolPolicy,
    timeout: Duration,
    connector: Arc<dyn ServerConnector>,
    state: RwLock<RegistryState>,
    /// Serializes connect/disconnect
    lifecycle: Mutex<()>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistryClient {
    /// Create a client that spawns its servers as child processes
    pub fn new(config: &ToolsConfig, logger: Arc<dyn Logger>) -> ConfigResult<Self> {
        let connector = Arc::new(ProcessConnector::new(Arc::clone(&logger)));
        Self::with_connector(config, connector, logger)
    }

    /// Create a client with a custom connector
    pub fn with_connector(
        config: &ToolsConfig,
        connector: Arc<dyn ServerConnector>,
        logger: Arc<dyn Logger>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            servers: config.servers.clone(),
            policy: config.policy(),
            timeout: config.timeout(),
            connector,
            state: RwLock::new(RegistryState::default()),
            lifecycle: Mutex::new(()),
            logger,
        })
    }

    /// Connect to every configured server
    ///
    /// Servers are contacted concurrently and registered as they finish. A
    /// server that fails to spawn, initialize or list its tools is logged and
    /// left out. Calling this while connected does nothing.
    pub async fn connect(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        if self.state.read().connected {
            self.logger.debug("[ToolRegistryClient] Already connected");
            return;
        }

        let mut pending: FuturesUnordered<_> = self
            .servers
            .iter()
            .map(|server| async move { (server, self.open_server(server).await) })
            .collect();

        let mut staged = RegistryState {
            connected: true,
            ..Default::default()
        };
        while let Some((server, outcome)) = pending.next().await {
            match outcome {
                Ok((connection, tools)) => {
                    let discovered = tools.len();
                    let registered = staged.register(
                        &server.name,
                        connection,
                        tools,
                        &self.policy,
                        self.logger.as_ref(),
                    );
                    self.logger.info(&format!(
                        "[ToolRegistryClient] Connected to '{}': {} tools ({} allowed)",
                        server.name, discovered, registered
                    ));
                }
                Err(e) => {
                    self.logger.error(&format!(
                        "[ToolRegistryClient] Failed to connect to '{}': {}",
                        server.name, e
                    ));
                }
            }
        }

        self.logger.info(&format!(
            "[ToolRegistryClient] {}/{} servers connected, {} tools available",
            staged.connections.len(),
            self.servers.len(),
            staged.tools.len()
        ));
        *self.state.write() = staged;
    }

    async fn open_server(&self, server: &ServerConfig) -> McpResult<(SharedConnection, Vec<Tool>)> {
        let connection = self.connector.connect(server).await?;
        match connection.list_tools().await {
            Ok(tools) => Ok((connection, tools)),
            Err(e) => {
                if let Err(close_err) = connection.close().await {
                    self.logger.warn(&format!(
                        "[ToolRegistryClient] Failed to close '{}' after catalog error: {}",
                        server.name, close_err
                    ));
                }
                Err(e)
            }
        }
    }

    /// Close every connection and clear the catalog
    ///
    /// Each connection is closed independently; a failure is logged and does
    /// not stop the others. Afterwards the client is back in its initial state.
    pub async fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let state = std::mem::take(&mut *self.state.write());
        if state.connections.is_empty() {
            return;
        }
        close_all(state.connections, Arc::clone(&self.logger)).await;
    }

    /// Clear the catalog now and close the connections in the background
    ///
    /// For teardown paths that cannot await, such as `Drop`. The connections
    /// are closed on the current tokio runtime; without one they are dropped,
    /// which ends their sessions.
    pub fn disconnect_detached(&self) {
        let state = std::mem::take(&mut *self.state.write());
        if state.connections.is_empty() {
            return;
        }

        let logger = Arc::clone(&self.logger);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close_all(state.connections, logger));
            }
            Err(_) => logger.warn(&format!(
                "[ToolRegistryClient] No runtime to close {} connections; dropping them",
                state.connections.len()
            )),
        }
    }

    /// Whether `connect()` has run since the last `disconnect()`
    pub fn is_connected(&self) -> bool {
        self.state.read().connected
    }

    /// The merged, filtered catalog
    pub fn get_tools(&self) -> Vec<Tool> {
        self.state.read().tools.clone()
    }

    /// Look up one tool in the catalog
    pub fn get_tool(&self, name: &str) -> Option<Tool> {
        self.state.read().tools.iter().find(|t| t.name == name).cloned()
    }

    /// Name of the server currently serving `name`
    pub fn server_for_tool(&self, name: &str) -> Option<String> {
        self.state.read().routes.get(name).cloned()
    }

    /// Policy check for a tool name
    pub fn is_tool_allowed(&self, name: &str) -> bool {
        self.policy.is_allowed(name)
    }

    /// Names of connected servers, in registration order
    pub fn get_connected_servers(&self) -> Vec<String> {
        self.state.read().server_order.clone()
    }

    /// Number of connected servers
    pub fn get_connected_servers_count(&self) -> usize {
        self.state.read().connections.len()
    }

    /// Execution timeout applied to each tool call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one tool
    ///
    /// Unknown tools, dead servers, tool errors and timeouts all come back
    /// as a failed result. A timeout leaves the connection usable.
    pub async fn execute_tool(&self, name: &str, arguments: ToolArguments) -> ToolExecutionResult {
        let started = Instant::now();
        let elapsed_ms = |started: Instant| started.elapsed().as_millis() as u64;

        let route = {
            let state = self.state.read();
            state
                .routes
                .get(name)
                .map(|server| (server.clone(), state.connections.get(server).cloned()))
        };
        let (server, connection) = match route {
            None => {
                self.logger
                    .warn(&format!("[ToolRegistryClient] Tool not found: {}", name));
                return ToolExecutionResult::failure(
                    name,
                    format!("Tool not found: {}", name),
                    elapsed_ms(started),
                );
            }
            Some((server, None)) => {
                return ToolExecutionResult::failure(
                    name,
                    format!("Server '{}' for tool '{}' is not connected", server, name),
                    elapsed_ms(started),
                );
            }
            Some((server, Some(connection))) => (server, connection),
        };

        self.logger.debug(&format!(
            "[ToolRegistryClient] Executing '{}' on '{}'",
            name, server
        ));

        match tokio::time::timeout(self.timeout, connection.call_tool(name, arguments)).await {
            Ok(Ok(payload)) => {
                let result = ToolExecutionResult::success(name, payload, elapsed_ms(started));
                self.logger.info(&format!(
                    "[ToolRegistryClient] '{}' succeeded in {}ms",
                    name,
                    result.execution_time_ms()
                ));
                result
            }
            Ok(Err(e)) => {
                self.logger.warn(&format!("[ToolRegistryClient] '{}' failed: {}", name, e));
                ToolExecutionResult::failure(name, e.to_string(), elapsed_ms(started))
            }
            Err(_) => {
                self.logger.warn(&format!(
                    "[ToolRegistryClient] '{}' timed out after {}ms",
                    name,
                    self.timeout.as_millis()
                ));
                ToolExecutionResult::failure(
                    name,
                    format!("Tool '{}' timed out after {}ms", name, self.timeout.as_millis()),
                    elapsed_ms(started),
                )
            }
        }
    }

    /// Execute a batch of requests concurrently
    ///
    /// Waits for every call; results come back in request order, each tagged
    /// with its request id.
    pub async fn execute_tools(&self, requests: &[ToolCallRequest]) -> Vec<ToolExecutionResult> {
        let calls = requests.iter().map(|request| async move {
            self.execute_tool(&request.name, request.arguments.clone())
                .await
                .with_call_id(&request.id)
        });
        join_all(calls).await
    }
}

async fn close_all(connections: HashMap<String, SharedConnection>, logger: Arc<dyn Logger>) {
    let closing = connections.into_iter().map(|(name, connection)| async move {
        let result = connection.close().await;
        (name, result)
    });
    for (name, result) in join_all(closing).await {
        match result {
            Ok(()) => logger.debug(&format!("[ToolRegistryClient] Closed '{}'", name)),
            Err(e) => logger.warn(&format!(
                "[ToolRegistryClient] Error closing '{}': {}",
                name, e
            )),
        }
    }
    logger.info("[ToolRegistryClient] Disconnected from all servers");
}

impl std::fmt::Debug for ToolRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistryClient")
            .field("servers", &self.servers.len())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .field("connected", &self.is_connected())
            .finish()
    }
}
