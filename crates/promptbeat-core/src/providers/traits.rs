//! Provider trait definition

use async_trait::async_trait;
use std::sync::Arc;

use super::error::ProviderResult;
use crate::types::{LlmResponse, ModelPricing, ProviderCapabilities, TokenUsage};

/// Provider trait for LLM implementations
///
/// Each provider (OpenAI, Anthropic, etc.) implements this trait. The
/// orchestrator implements it too, so it can stand in for a bare provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// What this provider supports
    fn capabilities(&self) -> ProviderCapabilities;

    /// Pricing of the configured model
    fn model_pricing(&self) -> ModelPricing;

    /// Estimate the cost of `usage` in US dollars
    fn estimate_cost(&self, usage: &TokenUsage) -> f64 {
        self.model_pricing().cost_for(usage)
    }

    /// Send a prompt and wait for the full response
    async fn call(&self, prompt: &str) -> ProviderResult<LlmResponse>;
}

/// Type alias for an Arc-wrapped provider
pub type SharedProvider = Arc<dyn Provider>;
