use super::schema::ParamType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    #[error("Parameter {name} must be a {expected}")]
    InvalidType { name: String, expected: ParamType },
    #[error("{0} not set")]
    MissingCredential(String),
    #[error("{0}")]
    Execution(String),
}
