//! Fenced JSON dialect for OpenAI-family models
//!
//! Mirrors the shape of OpenAI's native `tool_calls`, so models trained on
//! it produce well-formed requests in plain text:
//!
//! ````text
//! ```json
//! {"tool_calls": [{"id": "call_1", "type": "function",
//!   "function": {"name": "echo", "arguments": "{\"text\": \"hi\"}"}}]}
//! ```
//! ````

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::traits::{continuation, example_call, ToolCallDialect};
use crate::logging::Logger;
use crate::types::{Tool, ToolArguments, ToolCallRequest, ToolExecutionResult};

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced json pattern is valid")
});

/// Tool calls written as a fenced `{"tool_calls": [...]}` JSON object
pub struct OpenAiJsonDialect {
    logger: Arc<dyn Logger>,
}

impl OpenAiJsonDialect {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    fn parse_entry(&self, entry: &Value, fallback_id: String) -> Option<ToolCallRequest> {
        // Accept both {"function": {"name", "arguments"}} and a flat {"name", "arguments"}
        let function = entry.get("function").unwrap_or(entry);
        let name = match function.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => {
                self.logger
                    .warn("[OpenAiJsonDialect] Skipping tool call without a function name");
                return None;
            }
        };

        let arguments = match function.get("arguments") {
            None | Some(Value::Null) => ToolArguments::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(Value::String(encoded)) if encoded.trim().is_empty() => ToolArguments::new(),
            Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Object(map)) => map,
                _ => {
                    self.logger.warn(&format!(
                        "[OpenAiJsonDialect] Skipping call to '{}': arguments are not a JSON object",
                        name
                    ));
                    return None;
                }
            },
            Some(other) => {
                self.logger.warn(&format!(
                    "[OpenAiJsonDialect] Skipping call to '{}': unexpected arguments {}",
                    name, other
                ));
                return None;
            }
        };

        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback_id);
        Some(ToolCallRequest::new(id, name, arguments))
    }
}

impl ToolCallDialect for OpenAiJsonDialect {
    fn name(&self) -> &str {
        "openai-json"
    }

    fn format_tool_call(&self, call: &ToolCallRequest) -> String {
        let body = json!({
            "tool_calls": [{
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": Value::Object(call.arguments.clone()).to_string(),
                }
            }]
        });
        format!("```json\n{}\n```", body)
    }

    fn create_tool_prompt(&self, prompt: &str, tools: &[Tool]) -> String {
        let definitions: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect();
        let catalog = serde_json::to_string_pretty(&definitions)
            .unwrap_or_else(|_| Value::Array(definitions.clone()).to_string());

        format!(
            "You can call the following functions:\n\n```json\n{}\n```\n\n\
             To call functions, reply with a single fenced JSON block listing every call, like this:\n{}\n\n\
             `arguments` is a JSON-encoded object. Give each call a unique id. \
             When you no longer need functions, answer in plain text without a tool_calls block.\n\n{}",
            catalog,
            self.format_tool_call(&example_call(tools)),
            prompt
        )
    }

    fn has_tool_calls(&self, output: &str) -> bool {
        FENCED_JSON
            .captures_iter(output)
            .any(|caps| caps[1].contains("\"tool_calls\""))
    }

    fn extract_tool_calls(&self, output: &str) -> Vec<ToolCallRequest> {
        let mut calls = Vec::new();
        for caps in FENCED_JSON.captures_iter(output) {
            let body = &caps[1];
            if !body.contains("\"tool_calls\"") {
                continue;
            }
            let parsed: Value = match serde_json::from_str(body) {
                Ok(value) => value,
                Err(e) => {
                    self.logger.warn(&format!(
                        "[OpenAiJsonDialect] Skipping malformed tool_calls block: {}",
                        e
                    ));
                    continue;
                }
            };
            let Some(entries) = parsed.get("tool_calls").and_then(Value::as_array) else {
                self.logger
                    .warn("[OpenAiJsonDialect] Skipping block: tool_calls is not an array");
                continue;
            };
            for entry in entries {
                let fallback_id = format!("call_{}", calls.len() + 1);
                if let Some(call) = self.parse_entry(entry, fallback_id) {
                    calls.push(call);
                }
            }
        }
        calls
    }

    fn format_tool_results(
        &self,
        results: &[ToolExecutionResult],
        prior_prompt: &str,
        prior_output: &str,
    ) -> String {
        let entries: Vec<Value> = results
            .iter()
            .map(|result| {
                let mut entry = json!({
                    "name": result.tool_name(),
                    "success": result.is_success(),
                });
                if let Some(id) = result.call_id() {
                    entry["tool_call_id"] = json!(id);
                }
                match (result.result(), result.error()) {
                    (Some(payload), _) => entry["content"] = payload.clone(),
                    (None, Some(error)) => entry["error"] = json!(error),
                    (None, None) => {}
                }
                entry
            })
            .collect();
        let body = json!({ "tool_results": entries });
        let rendered = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
        continuation(
            prior_prompt,
            prior_output,
            &format!("Tool results:\n```json\n{}\n```", rendered),
        )
    }
}
