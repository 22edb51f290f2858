//! Dialect trait definition

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AnthropicDialect, OpenAiJsonDialect, XmlTagDialect};
use crate::logging::Logger;
use crate::types::{Tool, ToolCallRequest, ToolExecutionResult};

/// A textual convention for requesting tool calls from free-text model output
///
/// Dialects hold no per-call state: every method is a function of its
/// inputs, so one instance can be shared by any number of orchestrators.
pub trait ToolCallDialect: Send + Sync {
    /// Identifier surfaced in response metadata (e.g. "xml-tags")
    fn name(&self) -> &str;

    /// Render one call the way the model is expected to write it
    fn format_tool_call(&self, call: &ToolCallRequest) -> String;

    /// Embed the tool catalog and the calling instructions into `prompt`
    fn create_tool_prompt(&self, prompt: &str, tools: &[Tool]) -> String;

    /// Cheap check for a tool-call block in `output`
    fn has_tool_calls(&self, output: &str) -> bool;

    /// Parse every tool-call request in `output`
    ///
    /// Malformed requests are logged and skipped; the valid ones in the same
    /// output are still returned.
    fn extract_tool_calls(&self, output: &str) -> Vec<ToolCallRequest>;

    /// Build the next turn's prompt from the previous prompt, the model's
    /// output for it and the results of the calls it requested
    fn format_tool_results(
        &self,
        results: &[ToolExecutionResult],
        prior_prompt: &str,
        prior_output: &str,
    ) -> String;
}

/// Type alias for an Arc-wrapped dialect
pub type SharedDialect = Arc<dyn ToolCallDialect>;

/// Built-in dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialectKind {
    /// `<tool_call>{json}</tool_call>`
    XmlTags,
    /// `<function_calls><invoke name=".."><parameter name="..">`
    AnthropicInvoke,
    /// Fenced `{"tool_calls": [...]}` JSON
    #[serde(rename = "openai-json")]
    OpenAiJson,
}

impl DialectKind {
    /// Name used in configuration and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::XmlTags => "xml-tags",
            DialectKind::AnthropicInvoke => "anthropic-invoke",
            DialectKind::OpenAiJson => "openai-json",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "xml-tags" | "xml" => Some(DialectKind::XmlTags),
            "anthropic-invoke" | "anthropic" => Some(DialectKind::AnthropicInvoke),
            "openai-json" | "openai" => Some(DialectKind::OpenAiJson),
            _ => None,
        }
    }

    /// Construct the dialect
    pub fn create(self, logger: Arc<dyn Logger>) -> SharedDialect {
        match self {
            DialectKind::XmlTags => Arc::new(XmlTagDialect::new(logger)),
            DialectKind::AnthropicInvoke => Arc::new(AnthropicDialect::new(logger)),
            DialectKind::OpenAiJson => Arc::new(OpenAiJsonDialect::new(logger)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Example call shown in every tool prompt
pub(super) fn example_call(tools: &[Tool]) -> ToolCallRequest {
    let name = tools.first().map(|t| t.name.as_str()).unwrap_or("tool_name");
    let mut arguments = serde_json::Map::new();
    arguments.insert("argument".to_string(), serde_json::Value::from("value"));
    ToolCallRequest::new("call_1", name, arguments)
}

/// Previous prompt, the model's turn, then the result section
pub(super) fn continuation(prior_prompt: &str, prior_output: &str, results: &str) -> String {
    format!(
        "{}\n\nAssistant: {}\n\n{}\n\nUse the tool results above to continue. Request more tools if you still need them, otherwise give your final answer without any tool calls.",
        prior_prompt.trim_end(),
        prior_output.trim(),
        results
    )
}
