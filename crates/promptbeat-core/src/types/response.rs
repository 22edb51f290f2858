//! Provider response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ToolExecutionResult;

/// Token accounting for one or more model calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cached_tokens: None,
        }
    }

    pub fn with_cached(mut self, cached_tokens: u64) -> Self {
        self.cached_tokens = Some(cached_tokens);
        self
    }

    /// Add another call's usage to this one
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.cached_tokens = match (self.cached_tokens, other.cached_tokens) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        };
    }
}

/// One tool execution as reported in response metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub tool: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl From<&ToolExecutionResult> for ToolCallRecord {
    fn from(result: &ToolExecutionResult) -> Self {
        Self {
            tool: result.tool_name().to_string(),
            success: result.is_success(),
            error: result.error().map(str::to_string),
            execution_time_ms: result.execution_time_ms(),
        }
    }
}

/// Observability metadata attached to a response
///
/// The tool fields are only populated by the orchestrator; a bare provider
/// leaves them unset and may put anything it likes into `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_servers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of a single `Provider::call`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Text produced by the model
    pub content: String,
    /// Token usage
    #[serde(default)]
    pub usage: TokenUsage,
    /// Cost in US dollars
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create a response with the given text and no usage
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_accumulate() {
        let mut total = TokenUsage::new(10, 5);
        total.accumulate(&TokenUsage::new(20, 7).with_cached(4));

        assert_eq!(total.prompt_tokens, 30);
        assert_eq!(total.completion_tokens, 12);
        assert_eq!(total.total_tokens, 42);
        assert_eq!(total.cached_tokens, Some(4));
    }

    #[test]
    fn test_bare_metadata_has_no_tool_fields() {
        let value = serde_json::to_value(LlmResponse::text("hello")).unwrap();
        assert_eq!(value["metadata"], json!({}));
    }

    #[test]
    fn test_metadata_serialization() {
        let mut metadata = ResponseMetadata {
            tool_calls: Some(vec![ToolCallRecord {
                tool: "echo".to_string(),
                success: true,
                error: None,
                execution_time_ms: 12,
            }]),
            connected_servers: Some(vec!["local".to_string()]),
            dialect: Some("xml-tags".to_string()),
            ..Default::default()
        };
        metadata.extra.insert("model".to_string(), json!("test-model"));

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["toolCalls"][0]["tool"], "echo");
        assert_eq!(value["toolCalls"][0]["executionTimeMs"], 12);
        assert_eq!(value["connectedServers"], json!(["local"]));
        assert_eq!(value["dialect"], "xml-tags");
        assert_eq!(value["model"], "test-model");
    }
}
