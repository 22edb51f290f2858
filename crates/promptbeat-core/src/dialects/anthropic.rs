//! `<function_calls><invoke>` dialect for Anthropic-family models

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::traits::{continuation, example_call, ToolCallDialect};
use crate::logging::Logger;
use crate::types::{Tool, ToolArguments, ToolCallRequest, ToolExecutionResult};

static FUNCTION_CALLS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<function_calls>(.*?)</function_calls>").expect("function_calls pattern is valid")
});

static INVOKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<invoke\s+name\s*=\s*"([^"]*)"\s*>(.*?)</invoke>"#).expect("invoke pattern is valid")
});

static PARAMETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<parameter\s+name\s*=\s*"([^"]*)"\s*>(.*?)</parameter>"#)
        .expect("parameter pattern is valid")
});

/// Tool calls written as Anthropic-style `invoke` elements
///
/// ```text
/// <function_calls>
/// <invoke name="read_file">
/// <parameter name="path">/tmp/a.txt</parameter>
/// </invoke>
/// </function_calls>
/// ```
///
/// Parameter values that parse as JSON (numbers, booleans, objects) are
/// passed as JSON; anything else is passed as a string.
pub struct AnthropicDialect {
    logger: Arc<dyn Logger>,
}

impl AnthropicDialect {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    fn parse_invoke(&self, name: &str, body: &str) -> Option<ToolArguments> {
        if name.trim().is_empty() {
            self.logger
                .warn("[AnthropicDialect] Skipping invoke without a name");
            return None;
        }

        let mut arguments = ToolArguments::new();
        let mut parsed = 0;
        for caps in PARAMETER.captures_iter(body) {
            arguments.insert(caps[1].to_string(), parameter_value(&caps[2]));
            parsed += 1;
        }

        // An opening tag without its closing tag means the model cut the
        // parameter off; the call would run with partial input
        if body.matches("<parameter").count() != parsed {
            self.logger.warn(&format!(
                "[AnthropicDialect] Skipping invoke of '{}': unterminated parameter",
                name
            ));
            return None;
        }
        Some(arguments)
    }
}

/// Read a parameter body: JSON when it parses (a quoted literal is a
/// string), bare text otherwise
fn parameter_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    serde_json::from_str::<Value>(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

/// Write a parameter body that `parameter_value` reads back unchanged
fn render_parameter(value: &Value) -> String {
    match value {
        Value::String(text) if text.trim() == text && serde_json::from_str::<Value>(text).is_err() => {
            text.clone()
        }
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl ToolCallDialect for AnthropicDialect {
    fn name(&self) -> &str {
        "anthropic-invoke"
    }

    fn format_tool_call(&self, call: &ToolCallRequest) -> String {
        let mut out = format!("<function_calls>\n<invoke name=\"{}\">\n", call.name);
        for (key, value) in &call.arguments {
            out.push_str(&format!(
                "<parameter name=\"{}\">{}</parameter>\n",
                key,
                render_parameter(value)
            ));
        }
        out.push_str("</invoke>\n</function_calls>");
        out
    }

    fn create_tool_prompt(&self, prompt: &str, tools: &[Tool]) -> String {
        let mut out = String::from(
            "In this environment you have access to a set of tools you can use to answer the user's question.\n\
             You can invoke functions by writing a \"<function_calls>\" block like the following:\n",
        );
        out.push_str(&self.format_tool_call(&example_call(tools)));
        out.push_str(
            "\n\nString and scalar parameters should be written as is, while lists and objects should use JSON format.\n\
             Quote a string as a JSON literal when it would otherwise read as a number, boolean or JSON, or has leading or trailing spaces (e.g. \"94103\").\n\
             Several <invoke> elements may appear in one block.\n\n\
             Here are the functions available:\n<functions>\n",
        );
        for tool in tools {
            let definition = serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            });
            out.push_str(&format!("<function>{}</function>\n", definition));
        }
        out.push_str("</functions>\n\n");
        out.push_str(prompt);
        out
    }

    fn has_tool_calls(&self, output: &str) -> bool {
        FUNCTION_CALLS
            .captures_iter(output)
            .any(|caps| caps[1].contains("<invoke"))
    }

    fn extract_tool_calls(&self, output: &str) -> Vec<ToolCallRequest> {
        let mut calls = Vec::new();
        for block in FUNCTION_CALLS.captures_iter(output) {
            let body = &block[1];
            let mut invokes = 0;
            for caps in INVOKE.captures_iter(body) {
                invokes += 1;
                let name = caps[1].trim();
                if let Some(arguments) = self.parse_invoke(name, &caps[2]) {
                    let id = format!("call_{}", calls.len() + 1);
                    calls.push(ToolCallRequest::new(id, name, arguments));
                }
            }
            if body.matches("<invoke").count() != invokes {
                self.logger
                    .warn("[AnthropicDialect] Skipping unterminated or malformed invoke element");
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
        let mut block = String::from("<function_results>\n");
        for result in results {
            if result.is_success() {
                block.push_str(&format!(
                    "<result>\n<tool_name>{}</tool_name>\n<stdout>\n{}\n</stdout>\n</result>\n",
                    result.tool_name(),
                    escape(&result.render_text())
                ));
            } else {
                block.push_str(&format!(
                    "<error>\n<tool_name>{}</tool_name>\n<stderr>\n{}\n</stderr>\n</error>\n",
                    result.tool_name(),
                    escape(&result.render_text())
                ));
            }
        }
        block.push_str("</function_results>");
        continuation(prior_prompt, prior_output, &block)
    }
}
