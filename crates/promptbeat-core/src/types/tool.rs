//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments of a tool invocation, keyed by parameter name
pub type ToolArguments = Map<String, Value>;

/// Tool definition advertised by a connected server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (unique across connected servers)
    pub name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl Tool {
    /// Create a new tool definition with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_schema(),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// A tool invocation requested by the model, extracted from its free-text output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier of this request within the turn
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments for the tool
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Get an argument as a string
    pub fn get_arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Outcome of one tool invocation
///
/// Exactly one of `result` / `error` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionResult {
    tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    call_id: Option<String>,
    result: Option<Value>,
    error: Option<String>,
    execution_time_ms: u64,
    success: bool,
}

impl ToolExecutionResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, payload: Value, execution_time_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: None,
            result: Some(payload),
            error: None,
            execution_time_ms,
            success: true,
        }
    }

    /// Create a failed result
    pub fn failure(
        tool_name: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: None,
            result: None,
            error: Some(error.into()),
            execution_time_ms,
            success: false,
        }
    }

    /// Tag the result with the id of the request it answers
    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Render the payload or error as plain text for a prompt
    pub fn render_text(&self) -> String {
        match (&self.result, &self.error) {
            (Some(Value::String(text)), _) => text.clone(),
            (Some(value), _) => value.to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        }
    }
}
