//! Tool registry, dispatch, and the builtin tools.

pub mod builtin;
pub mod errors;
mod manager;
mod schema;
mod tool;
mod types;

pub use builtin::BuiltinConfig;
pub use errors::ToolError;
pub use manager::ToolManager;
pub use schema::{
    CALC, DefaultValue, KB, ParamType, TEXT_ANALYZER, ToolKind, ToolParameter, ToolSchema,
    UNIT_CONVERTER, WEATHER,
};
pub use tool::Tool;
pub use types::{ToolArgs, ToolResult, render_value};
