//! Tool-related types.

use super::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

/// Plain key/value arguments for a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArgs(pub Map<String, Value>);

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A string argument.
    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        match self.0.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ToolError::InvalidType {
                name: name.to_string(),
                expected: super::ParamType::String,
            }),
            None => Err(ToolError::MissingParameter(name.to_string())),
        }
    }

    /// A numeric argument.
    pub fn number(&self, name: &str) -> Result<f64, ToolError> {
        match self.0.get(name) {
            Some(value) => value.as_f64().ok_or_else(|| ToolError::InvalidType {
                name: name.to_string(),
                expected: super::ParamType::Number,
            }),
            None => Err(ToolError::MissingParameter(name.to_string())),
        }
    }
}

/// Normalize model-supplied arguments into a plain map.
///
/// Objects pass through, JSON-encoded object strings are decoded, and
/// anything else becomes an empty map.
impl From<Value> for ToolArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::default(),
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Self(map),
                _ => {
                    debug!(raw = %raw, "tool arguments are not a JSON object, using none");
                    Self::default()
                }
            },
            other => {
                debug!(args = %other, "unsupported tool argument structure, using none");
                Self::default()
            }
        }
    }
}

/// The outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { output: Value },
    Failure { error: ToolError },
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn output(&self) -> Option<&Value> {
        match self {
            ToolResult::Success { output } => Some(output),
            ToolResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { error } => Some(error),
        }
    }

    /// Plain-text rendering: the output on success, the error message on failure.
    pub fn to_text(&self) -> String {
        match self {
            ToolResult::Success { output } => render_value(output),
            ToolResult::Failure { error } => error.to_string(),
        }
    }

    /// Payload for a function response sent back to the model.
    pub fn to_response(&self) -> Value {
        match self {
            ToolResult::Success { output } => json!({ "result": output }),
            ToolResult::Failure { error } => json!({ "error": error.to_string() }),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(output) => ToolResult::Success { output },
            Err(error) => ToolResult::Failure { error },
        }
    }
}

/// Strings render verbatim, everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
