//! Provider capability and pricing types

use serde::{Deserialize, Serialize};

use super::TokenUsage;

/// What a provider can do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    /// Whether the provider supports prompt caching
    #[serde(default)]
    pub prompt_caching: bool,
    /// Whether the provider supports streaming
    #[serde(default)]
    pub streaming: bool,
    /// Whether the provider supports tool/function calling
    #[serde(default)]
    pub function_calling: bool,
    /// Whether the provider supports image input
    #[serde(default)]
    pub vision: bool,
    /// Maximum context length in tokens
    #[serde(default)]
    pub max_context_tokens: u32,
}

impl ProviderCapabilities {
    /// Create capabilities with all features enabled
    pub fn full(max_context_tokens: u32) -> Self {
        Self {
            prompt_caching: true,
            streaming: true,
            function_calling: true,
            vision: true,
            max_context_tokens,
        }
    }
}

/// Price per million tokens, in US dollars
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
    /// Price for cached prompt tokens, when the provider discounts them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_input_per_million: Option<f64>,
}

impl ModelPricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
            cached_input_per_million: None,
        }
    }

    pub fn with_cached_input(mut self, per_million: f64) -> Self {
        self.cached_input_per_million = Some(per_million);
        self
    }

    /// Cost of `usage` under this pricing
    pub fn cost_for(&self, usage: &TokenUsage) -> f64 {
        // Cached tokens are only discounted when the model has a cached price
        let cached = match self.cached_input_per_million {
            Some(_) => usage.cached_tokens.unwrap_or(0).min(usage.prompt_tokens),
            None => 0,
        };
        let uncached = usage.prompt_tokens - cached;

        (uncached as f64 * self.input_per_million
            + cached as f64 * self.cached_input_per_million.unwrap_or(0.0)
            + usage.completion_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}
