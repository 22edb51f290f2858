//! `<tool_call>` dialect, the fallback for providers without a mapping

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::traits::{continuation, example_call, ToolCallDialect};
use crate::logging::Logger;
use crate::types::{Tool, ToolArguments, ToolCallRequest, ToolExecutionResult};

static TOOL_CALL_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<tool_call>\s*(.*?)\s*</tool_call>").expect("tool_call pattern is valid")
});

#[derive(Deserialize)]
struct RawCall {
    name: String,
    #[serde(default, alias = "parameters", alias = "input")]
    arguments: Option<Value>,
}

/// Tool calls written as `<tool_call>{"name": .., "arguments": {..}}</tool_call>`
pub struct XmlTagDialect {
    logger: Arc<dyn Logger>,
}

impl XmlTagDialect {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    fn parse_block(&self, body: &str) -> Option<(String, ToolArguments)> {
        let raw: RawCall = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => {
                self.logger.warn(&format!(
                    "[XmlTagDialect] Skipping malformed tool_call block: {}",
                    e
                ));
                return None;
            }
        };
        if raw.name.trim().is_empty() {
            self.logger
                .warn("[XmlTagDialect] Skipping tool_call block without a name");
            return None;
        }
        let arguments = match raw.arguments {
            None | Some(Value::Null) => ToolArguments::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                self.logger.warn(&format!(
                    "[XmlTagDialect] Skipping call to '{}': arguments must be an object, got {}",
                    raw.name, other
                ));
                return None;
            }
        };
        Some((raw.name, arguments))
    }
}

impl ToolCallDialect for XmlTagDialect {
    fn name(&self) -> &str {
        "xml-tags"
    }

    fn format_tool_call(&self, call: &ToolCallRequest) -> String {
        let body = serde_json::json!({ "name": call.name, "arguments": call.arguments });
        format!("<tool_call>{}</tool_call>", body)
    }

    fn create_tool_prompt(&self, prompt: &str, tools: &[Tool]) -> String {
        let mut out = String::from("You have access to the following tools:\n\n<tools>\n");
        for tool in tools {
            out.push_str(&format!(
                "<tool name=\"{}\">\n<description>{}</description>\n<input_schema>{}</input_schema>\n</tool>\n",
                tool.name, tool.description, tool.input_schema
            ));
        }
        out.push_str("</tools>\n\n");
        out.push_str("To call a tool, write one block per call, exactly like this:\n");
        out.push_str(&self.format_tool_call(&example_call(tools)));
        out.push_str(
            "\n\nYou may request several tools at once. The results will be sent back to you. \
             When you no longer need tools, answer without any <tool_call> blocks.\n\n",
        );
        out.push_str("User request:\n");
        out.push_str(prompt);
        out
    }

    fn has_tool_calls(&self, output: &str) -> bool {
        TOOL_CALL_BLOCK.is_match(output)
    }

    fn extract_tool_calls(&self, output: &str) -> Vec<ToolCallRequest> {
        TOOL_CALL_BLOCK
            .captures_iter(output)
            .filter_map(|caps| self.parse_block(&caps[1]))
            .enumerate()
            .map(|(i, (name, arguments))| {
                ToolCallRequest::new(format!("call_{}", i + 1), name, arguments)
            })
            .collect()
    }

    fn format_tool_results(
        &self,
        results: &[ToolExecutionResult],
        prior_prompt: &str,
        prior_output: &str,
    ) -> String {
        let mut block = String::from("<tool_responses>\n");
        for result in results {
            let status = if result.is_success() { "success" } else { "error" };
            block.push_str(&format!(
                "<tool_response name=\"{}\" status=\"{}\">\n{}\n</tool_response>\n",
                result.tool_name(),
                status,
                result.render_text()
            ));
        }
        block.push_str("</tool_responses>");
        continuation(prior_prompt, prior_output, &block)
    }
}
