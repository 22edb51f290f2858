//! The bounded multi-turn tool-use loop

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::session::SessionState;
use crate::config::{ConfigError, ConfigResult, ToolsConfig};
use crate::dialects::{DialectRegistry, SharedDialect};
use crate::logging::Logger;
use crate::mcp::ServerConnector;
use crate::providers::{Provider, ProviderResult, SharedProvider};
use crate::tools::ToolRegistryClient;
use crate::types::{LlmResponse, ModelPricing, ProviderCapabilities, TokenUsage, ToolCallRecord};

/// Provider wrapper that lets the model use tools from the registry
///
/// One instance runs one `call()` at a time: the tool-call counter belongs
/// to the instance and is reset when a call starts. Use separate instances
/// for concurrent calls.
pub struct ToolOrchestrator {
    provider: SharedProvider,
    client: ToolRegistryClient,
    dialect: SharedDialect,
    session: Mutex<SessionState>,
    logger: Arc<dyn Logger>,
}

impl ToolOrchestrator {
    /// Wrap `provider` with an existing client and dialect
    pub fn new(
        provider: SharedProvider,
        client: ToolRegistryClient,
        dialect: SharedDialect,
        max_tool_calls: usize,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            client,
            dialect,
            session: Mutex::new(SessionState::new(max_tool_calls)),
            logger,
        }
    }

    /// Build the client and pick the dialect from configuration
    ///
    /// Fails when tool calling is enabled without any server. When it is
    /// disabled the servers are ignored and every call goes straight to
    /// the provider.
    pub fn from_config(
        provider: SharedProvider,
        config: &ToolsConfig,
        logger: Arc<dyn Logger>,
    ) -> ConfigResult<Self> {
        let config = Self::effective_config(config)?;
        let client = ToolRegistryClient::new(&config, Arc::clone(&logger))?;
        Ok(Self::assemble(provider, client, &config, logger))
    }

    /// Same as [`ToolOrchestrator::from_config`] with a custom connector
    pub fn from_config_with_connector(
        provider: SharedProvider,
        config: &ToolsConfig,
        connector: Arc<dyn ServerConnector>,
        logger: Arc<dyn Logger>,
    ) -> ConfigResult<Self> {
        let config = Self::effective_config(config)?;
        let client = ToolRegistryClient::with_connector(&config, connector, Arc::clone(&logger))?;
        Ok(Self::assemble(provider, client, &config, logger))
    }

    fn effective_config(config: &ToolsConfig) -> ConfigResult<ToolsConfig> {
        if !config.enabled {
            return Ok(ToolsConfig {
                servers: Vec::new(),
                ..config.clone()
            });
        }
        if config.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        Ok(config.clone())
    }

    fn assemble(
        provider: SharedProvider,
        client: ToolRegistryClient,
        config: &ToolsConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let dialect = DialectRegistry::new(Arc::clone(&logger)).resolve(config.dialect, provider.name());
        Self::new(provider, client, dialect, config.max_tool_calls, logger)
    }

    /// State of the current or last call
    pub fn session_state(&self) -> SessionState {
        *self.session.lock()
    }

    /// The registry client used for tool execution
    pub fn client(&self) -> &ToolRegistryClient {
        &self.client
    }

    /// The active dialect
    pub fn dialect(&self) -> &SharedDialect {
        &self.dialect
    }

    /// The wrapped provider
    pub fn inner(&self) -> &SharedProvider {
        &self.provider
    }

    async fn run(&self, prompt: &str) -> ProviderResult<LlmResponse> {
        let tools = self.client.get_tools();
        if tools.is_empty() {
            self.logger
                .info("[ToolOrchestrator] No tools available, calling provider directly");
            return self.provider.call(prompt).await;
        }

        self.logger.info(&format!(
            "[ToolOrchestrator] {} tools available, dialect '{}'",
            tools.len(),
            self.dialect.name()
        ));

        let mut current_prompt = self.dialect.create_tool_prompt(prompt, &tools);
        let mut records: Vec<ToolCallRecord> = Vec::new();
        let mut usage = TokenUsage::default();
        let mut cost = 0.0;
        let mut turn = 0usize;

        let mut response = loop {
            turn += 1;
            let response = self.provider.call(&current_prompt).await?;
            usage.accumulate(&response.usage);
            cost += response.cost;

            if !self.dialect.has_tool_calls(&response.content) {
                self.logger.debug(&format!(
                    "[ToolOrchestrator] Turn {}: no tool calls, finishing",
                    turn
                ));
                break response;
            }

            let session = self.session_state();
            if session.is_exhausted() {
                self.logger.info(&format!(
                    "[ToolOrchestrator] Tool-call budget of {} exhausted after {} turns",
                    session.max_tool_calls, turn
                ));
                break response;
            }

            let mut requests = self.dialect.extract_tool_calls(&response.content);
            if requests.is_empty() {
                self.logger.error(&format!(
                    "[ToolOrchestrator] Turn {}: output looked like a tool call but nothing could be parsed with dialect '{}'",
                    turn,
                    self.dialect.name()
                ));
                break response;
            }

            let remaining = session.remaining();
            if requests.len() > remaining {
                self.logger.warn(&format!(
                    "[ToolOrchestrator] Turn {}: {} tool calls requested, only {} left in budget; dropping the rest",
                    turn,
                    requests.len(),
                    remaining
                ));
                requests.truncate(remaining);
            }

            self.logger.debug(&format!(
                "[ToolOrchestrator] Turn {}: executing {} tool calls",
                turn,
                requests.len()
            ));
            let results = self.client.execute_tools(&requests).await;

            // Failed executions count against the budget too
            self.session.lock().tool_call_count += results.len();
            records.extend(results.iter().map(ToolCallRecord::from));

            current_prompt =
                self.dialect
                    .format_tool_results(&results, &current_prompt, &response.content);
        };

        response.usage = usage;
        response.cost = cost;
        response.metadata.tool_calls = Some(records);
        response.metadata.connected_servers = Some(self.client.get_connected_servers());
        response.metadata.dialect = Some(self.dialect.name().to_string());
        Ok(response)
    }
}

#[async_trait]
impl Provider for ToolOrchestrator {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            function_calling: true,
            ..self.provider.capabilities()
        }
    }

    fn model_pricing(&self) -> ModelPricing {
        self.provider.model_pricing()
    }

    fn estimate_cost(&self, usage: &TokenUsage) -> f64 {
        self.provider.estimate_cost(usage)
    }

    async fn call(&self, prompt: &str) -> ProviderResult<LlmResponse> {
        {
            let mut session = self.session.lock();
            let max_tool_calls = session.max_tool_calls;
            *session = SessionState::new(max_tool_calls);
        }

        let mut guard = CallGuard::new(self);
        self.client.connect().await;
        self.session.lock().connected = true;

        let outcome = self.run(prompt).await;

        // Runs for provider errors as well as for normal completion
        self.client.disconnect().await;
        self.session.lock().connected = false;
        guard.disarm();

        if let Err(e) = &outcome {
            self.logger
                .error(&format!("[ToolOrchestrator] Provider call failed: {}", e));
        }
        outcome
    }
}

/// Tears the session down if a `call()` never reaches its own cleanup
///
/// That happens when the caller drops the call future (e.g. an outer
/// timeout) or the provider panics.
struct CallGuard<'a> {
    orchestrator: &'a ToolOrchestrator,
    armed: bool,
}

impl<'a> CallGuard<'a> {
    fn new(orchestrator: &'a ToolOrchestrator) -> Self {
        Self {
            orchestrator,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.orchestrator
            .logger
            .warn("[ToolOrchestrator] Call abandoned before cleanup, disconnecting in background");
        self.orchestrator.client.disconnect_detached();
        self.orchestrator.session.lock().connected = false;
    }
}

impl std::fmt::Debug for ToolOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolOrchestrator")
            .field("provider", &self.provider.name())
            .field("dialect", &self.dialect.name())
            .field("session", &self.session_state())
            .field("client", &self.client)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use serde_json::json;

    use crate::config::ServerConfig;
    use crate::dialects::DialectKind;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{MemoryConnector, MemoryToolServer};
    use crate::providers::{MockProvider, MockStep, ProviderError};
    use crate::types::Tool;

    const ECHO_HI: &str = r#"I'll use the echo tool.
<tool_call>{"name": "echo", "arguments": {"text": "hi"}}</tool_call>"#;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn tools_config(max_tool_calls: usize) -> ToolsConfig {
        ToolsConfig::with_servers(vec![ServerConfig::process("local", "unused")])
            .with_max_tool_calls(max_tool_calls)
    }

    fn orchestrator(
        provider: Arc<MockProvider>,
        server: MemoryToolServer,
        max_tool_calls: usize,
        logger: Arc<dyn Logger>,
    ) -> ToolOrchestrator {
        ToolOrchestrator::from_config_with_connector(
            provider,
            &tools_config(max_tool_calls),
            Arc::new(MemoryConnector::new().with_server("local", server)),
            logger,
        )
        .expect("valid config")
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let provider = Arc::new(MockProvider::scripted(
            vec![MockStep::reply(ECHO_HI), MockStep::reply("The tool said hi.")],
            logger(),
        ));
        let server = MemoryToolServer::echo();
        let orchestrator = orchestrator(provider.clone(), server.clone(), 5, logger());

        let response = orchestrator.call("say hi").await.unwrap();

        assert_eq!(response.content, "The tool said hi.");
        assert_eq!(provider.call_count(), 2);

        let prompts = provider.prompts();
        assert!(prompts[0].contains("<tool name=\"echo\">"));
        assert!(prompts[0].contains("say hi"));
        assert!(prompts[1].contains("<tool_response name=\"echo\" status=\"success\">\nhi\n"));

        let calls = response.metadata.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "echo");
        assert!(calls[0].success);
        assert_eq!(response.metadata.connected_servers, Some(vec!["local".to_string()]));
        assert_eq!(response.metadata.dialect.as_deref(), Some("xml-tags"));

        assert_eq!(server.connections_opened(), 1);
        assert_eq!(server.connections_closed(), 1);
        assert!(!orchestrator.session_state().connected);
    }

    #[tokio::test]
    async fn test_usage_and_cost_summed_over_turns() {
        let provider = Arc::new(MockProvider::scripted(
            vec![MockStep::reply(ECHO_HI), MockStep::reply("done")],
            logger(),
        ));
        let orchestrator = orchestrator(provider.clone(), MemoryToolServer::echo(), 5, logger());

        let response = orchestrator.call("say hi").await.unwrap();

        let prompts = provider.prompts();
        let expected_prompt = (prompts[0].len() / 4 + prompts[1].len() / 4) as u64;
        let expected_completion = (ECHO_HI.len() / 4 + "done".len() / 4) as u64;
        assert_eq!(response.usage.prompt_tokens, expected_prompt);
        assert_eq!(response.usage.completion_tokens, expected_completion);
        assert_eq!(response.usage.total_tokens, expected_prompt + expected_completion);

        let expected_cost = orchestrator.estimate_cost(&response.usage);
        assert!((response.cost - expected_cost).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_budget_bounds_executions() {
        let greedy = r#"<tool_call>{"name": "echo", "arguments": {"text": "a"}}</tool_call>
<tool_call>{"name": "echo", "arguments": {"text": "b"}}</tool_call>"#;
        let provider = Arc::new(MockProvider::scripted(vec![MockStep::reply(greedy)], logger()));
        let server = MemoryToolServer::echo();
        let memory_logger = Arc::new(MemoryLogger::new());
        let orchestrator = orchestrator(provider.clone(), server.clone(), 3, memory_logger.clone());

        let response = orchestrator.call("loop forever").await.unwrap();

        // 2 executions, then 1 (truncated), then the budget check stops the loop
        assert_eq!(server.calls().len(), 3);
        assert_eq!(response.metadata.tool_calls.as_ref().unwrap().len(), 3);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(orchestrator.session_state().tool_call_count, 3);
        assert!(memory_logger.contains(LogLevel::Warn, "only 1 left"));
        assert!(memory_logger.contains(LogLevel::Info, "exhausted"));
        assert_eq!(server.connections_closed(), 1);
    }

    #[tokio::test]
    async fn test_budget_holds_for_any_limit() {
        for max in 0..5 {
            let provider = Arc::new(MockProvider::scripted(vec![MockStep::reply(ECHO_HI)], logger()));
            let server = MemoryToolServer::echo();
            let orchestrator = orchestrator(provider, server.clone(), max, logger());

            orchestrator.call("again and again").await.unwrap();
            assert_eq!(server.calls().len(), max, "max_tool_calls = {}", max);
        }
    }

    #[tokio::test]
    async fn test_failed_calls_count_against_budget() {
        let unknown = r#"<tool_call>{"name": "missing", "arguments": {}}</tool_call>"#;
        let provider = Arc::new(MockProvider::scripted(vec![MockStep::reply(unknown)], logger()));
        let orchestrator = orchestrator(provider.clone(), MemoryToolServer::echo(), 2, logger());

        let response = orchestrator.call("use a missing tool").await.unwrap();

        let calls = response.metadata.tool_calls.unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| !c.success));
        assert!(calls[0].error.as_deref().unwrap().contains("not found"));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_disconnect_runs_when_provider_fails() {
        let provider = Arc::new(MockProvider::scripted(
            vec![MockStep::reply(ECHO_HI), MockStep::fail("connection reset")],
            logger(),
        ));
        let server = MemoryToolServer::echo();
        let orchestrator = orchestrator(provider.clone(), server.clone(), 5, logger());

        let err = orchestrator.call("say hi").await.unwrap_err();

        assert!(matches!(&err, ProviderError::Other(msg) if msg.contains("connection reset")));
        assert_eq!(provider.call_count(), 2);
        assert_eq!(server.connections_opened(), 1);
        assert_eq!(server.connections_closed(), 1);
        assert!(!orchestrator.session_state().connected);
        assert!(orchestrator.client().get_tools().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_call_still_disconnects() {
        let provider = Arc::new(MockProvider::fixed("no tools needed", logger()).with_delay(500));
        let server = MemoryToolServer::echo();
        let memory_logger = Arc::new(MemoryLogger::new());
        let orchestrator = orchestrator(provider.clone(), server.clone(), 5, memory_logger.clone());

        let outcome = tokio::time::timeout(Duration::from_millis(50), orchestrator.call("hi")).await;
        assert!(outcome.is_err());

        assert!(!orchestrator.session_state().connected);
        assert!(!orchestrator.client().is_connected());
        assert!(memory_logger.contains(LogLevel::Warn, "abandoned"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(server.connections_opened(), 1);
        assert_eq!(server.connections_closed(), 1);

        // The next call opens a fresh connection rather than reusing the old one
        orchestrator.call("again").await.unwrap();
        assert_eq!(server.connections_opened(), 2);
        assert_eq!(server.connections_closed(), 2);
    }

    #[tokio::test]
    async fn test_empty_catalog_calls_provider_once_unchanged() {
        let provider = Arc::new(MockProvider::fixed("plain answer", logger()));
        let client = ToolRegistryClient::with_connector(
            &ToolsConfig::default(),
            Arc::new(MemoryConnector::new()),
            logger(),
        )
        .unwrap();
        let orchestrator = ToolOrchestrator::new(
            provider.clone(),
            client,
            DialectKind::XmlTags.create(logger()),
            5,
            logger(),
        );

        let response = orchestrator.call("say hi").await.unwrap();

        assert_eq!(provider.prompts(), vec!["say hi".to_string()]);
        let direct = MockProvider::fixed("plain answer", logger()).call("say hi").await.unwrap();
        assert_eq!(response, direct);
        assert!(response.metadata.tool_calls.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_servers_degrade_to_direct_call() {
        let provider = Arc::new(MockProvider::fixed("no tools today", logger()));
        let orchestrator = ToolOrchestrator::from_config_with_connector(
            provider.clone(),
            &tools_config(5),
            Arc::new(MemoryConnector::new().with_unreachable("local", "spawn failed")),
            logger(),
        )
        .unwrap();

        let response = orchestrator.call("hello").await.unwrap();

        assert_eq!(response.content, "no tools today");
        assert_eq!(provider.prompts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_unparseable_tool_call_finishes_with_error_log() {
        let broken = "<tool_call>{\"name\": \"echo\", \"arguments\": {</tool_call>";
        let provider = Arc::new(MockProvider::scripted(vec![MockStep::reply(broken)], logger()));
        let memory_logger = Arc::new(MemoryLogger::new());
        let server = MemoryToolServer::echo();
        let orchestrator = orchestrator(provider.clone(), server.clone(), 5, memory_logger.clone());

        let response = orchestrator.call("say hi").await.unwrap();

        assert_eq!(response.content, broken);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(response.metadata.tool_calls, Some(Vec::new()));
        assert!(server.calls().is_empty());
        assert!(memory_logger.contains(LogLevel::Error, "nothing could be parsed"));
    }

    #[tokio::test]
    async fn test_turn_tools_run_concurrently() {
        let server = MemoryToolServer::new()
            .with_delayed_tool(Tool::new("fast", "100ms"), Duration::from_millis(100), |_| {
                Ok(json!("fast"))
            })
            .with_delayed_tool(Tool::new("slow", "150ms"), Duration::from_millis(150), |_| {
                Ok(json!("slow"))
            });
        let both = r#"<tool_call>{"name": "fast"}</tool_call><tool_call>{"name": "slow"}</tool_call>"#;
        let provider = Arc::new(MockProvider::scripted(
            vec![MockStep::reply(both), MockStep::reply("done")],
            logger(),
        ));
        let orchestrator = orchestrator(provider, server, 5, logger());

        let started = Instant::now();
        let response = orchestrator.call("go").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.metadata.tool_calls.unwrap().len(), 2);
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_millis(240), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_session_resets_between_calls() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                MockStep::reply(ECHO_HI),
                MockStep::reply("first done"),
                MockStep::reply(ECHO_HI),
                MockStep::reply("second done"),
            ],
            logger(),
        ));
        let server = MemoryToolServer::echo();
        let orchestrator = orchestrator(provider, server.clone(), 1, logger());

        let first = orchestrator.call("one").await.unwrap();
        let second = orchestrator.call("two").await.unwrap();

        assert_eq!(first.content, "first done");
        assert_eq!(second.content, "second done");
        assert_eq!(orchestrator.session_state().tool_call_count, 1);
        assert_eq!(server.connections_opened(), 2);
        assert_eq!(server.connections_closed(), 2);
    }

    #[tokio::test]
    async fn test_delegates_provider_surface() {
        let provider = Arc::new(MockProvider::echo(logger()).with_name("ollama"));
        let orchestrator = orchestrator(provider.clone(), MemoryToolServer::echo(), 5, logger());

        assert_eq!(orchestrator.name(), "ollama");
        let caps = orchestrator.capabilities();
        assert!(!provider.capabilities().function_calling);
        assert!(caps.function_calling);
        assert_eq!(caps.max_context_tokens, provider.capabilities().max_context_tokens);
        assert_eq!(orchestrator.model_pricing(), provider.model_pricing());

        let usage = TokenUsage::new(1_000, 500);
        assert_eq!(orchestrator.estimate_cost(&usage), provider.estimate_cost(&usage));
    }

    #[test]
    fn test_from_config_requires_servers_when_enabled() {
        let provider: SharedProvider = Arc::new(MockProvider::echo(logger()));
        let enabled = ToolsConfig {
            enabled: true,
            ..Default::default()
        };
        let result = ToolOrchestrator::from_config(provider.clone(), &enabled, logger());
        assert!(matches!(result, Err(ConfigError::NoServers)));

        let disabled = tools_config(5);
        let disabled = ToolsConfig {
            enabled: false,
            ..disabled
        };
        let orchestrator = ToolOrchestrator::from_config(provider, &disabled, logger()).unwrap();
        assert_eq!(orchestrator.client().get_connected_servers_count(), 0);
    }

    #[test]
    fn test_from_config_resolves_dialect() {
        let claude: SharedProvider = Arc::new(MockProvider::echo(logger()).with_name("claude"));
        let config = tools_config(5);

        let orchestrator = ToolOrchestrator::from_config(claude.clone(), &config, logger()).unwrap();
        assert_eq!(orchestrator.dialect().name(), "anthropic-invoke");

        let overridden = config.with_dialect(DialectKind::OpenAiJson);
        let orchestrator = ToolOrchestrator::from_config(claude, &overridden, logger()).unwrap();
        assert_eq!(orchestrator.dialect().name(), "openai-json");
    }

    #[tokio::test]
    async fn test_anthropic_dialect_end_to_end() {
        let invoke = r#"<function_calls>
<invoke name="echo"><parameter name="text">hi</parameter></invoke>
</function_calls>"#;
        let provider = Arc::new(
            MockProvider::scripted(vec![MockStep::reply(invoke), MockStep::reply("said hi")], logger())
                .with_name("anthropic"),
        );
        let orchestrator = orchestrator(provider.clone(), MemoryToolServer::echo(), 5, logger());

        let response = orchestrator.call("say hi").await.unwrap();

        assert_eq!(response.content, "said hi");
        assert_eq!(response.metadata.dialect.as_deref(), Some("anthropic-invoke"));
        assert!(provider.prompts()[1].contains("<stdout>\nhi\n</stdout>"));
    }
}
