//! Mock provider for testing
//!
//! Provides deterministic, configurable responses without network dependencies.
//! Every prompt it receives is recorded so tests can inspect what the
//! orchestrator sent on each turn.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::Provider;
use crate::logging::Logger;
use crate::types::{LlmResponse, ModelPricing, ProviderCapabilities, TokenUsage};

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Reply with this text
    Reply(String),
    /// Fail the call with this message
    Fail(String),
}

impl MockStep {
    pub fn reply(text: impl Into<String>) -> Self {
        MockStep::Reply(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockStep::Fail(message.into())
    }
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the prompt
    #[default]
    Echo,
    /// Return a fixed response on every call
    Fixed(String),
    /// Play the steps in order; the last step repeats once the script runs out
    Script(Vec<MockStep>),
    /// Fail every call
    Error(String),
}

/// Configuration for the mock provider
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Provider name reported by `name()`
    pub name: String,
    /// Artificial latency per call in milliseconds (0 = no delay)
    pub delay_ms: u64,
    /// Whether the provider claims native function calling
    pub function_calling: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            name: "mock".to_string(),
            delay_ms: 0,
            function_calling: false,
        }
    }
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: MockConfig,
    prompts: Mutex<Vec<String>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider with default config
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            prompts: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider (echoes back the prompt)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Fixed(response.into()),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create a provider that plays back a script of turns
    pub fn scripted(steps: Vec<MockStep>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Script(steps),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Error(message.into()),
                ..Default::default()
            },
            logger,
        )
    }

    /// Report a different provider name (drives dialect selection)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set per-call delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Every prompt received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    fn next_step(&self, call_index: usize, prompt: &str) -> MockStep {
        match &self.config.mode {
            MockMode::Echo => MockStep::Reply(format!("Echo: {}", prompt)),
            MockMode::Fixed(response) => MockStep::Reply(response.clone()),
            MockMode::Error(message) => MockStep::Fail(message.clone()),
            MockMode::Script(steps) => steps
                .get(call_index)
                .or_else(|| steps.last())
                .cloned()
                .unwrap_or_else(|| MockStep::Reply(String::new())),
        }
    }

    /// Simple approximation: ~4 characters per token
    fn count_tokens(text: &str) -> u64 {
        (text.len() / 4) as u64
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            prompt_caching: false,
            streaming: false,
            function_calling: self.config.function_calling,
            vision: false,
            max_context_tokens: 128_000,
        }
    }

    fn model_pricing(&self) -> ModelPricing {
        ModelPricing::new(1.0, 2.0)
    }

    async fn call(&self, prompt: &str) -> ProviderResult<LlmResponse> {
        let call_index = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        self.logger
            .debug(&format!("[MockProvider] call #{} ({} chars)", call_index + 1, prompt.len()));

        if self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }

        match self.next_step(call_index, prompt) {
            MockStep::Reply(content) => {
                let usage = TokenUsage::new(Self::count_tokens(prompt), Self::count_tokens(&content));
                let cost = self.estimate_cost(&usage);
                Ok(LlmResponse::text(content).with_usage(usage).with_cost(cost))
            }
            MockStep::Fail(message) => Err(ProviderError::other(format!("Mock error: {}", message))),
        }
    }
}
