//! Deckhand runtime: tool-augmented question answering over an LLM backend.
//!
//! # Overview
//!
//! - **Backend**: a trait abstracting LLM providers. [`GeminiBackend`] talks
//!   to the Gemini `generateContent` API.
//! - **ToolManager**: registry and dispatcher for tools the model may call.
//!   The builtin set is calculator, weather, knowledge base, unit converter
//!   and text analyzer.
//! - **Agent**: answers one question. A requested tool's output is the answer.
//! - **Session**: a conversation with history. Tool results are sent back to
//!   the model so it can phrase the answer.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use runtime::{Agent, BuiltinConfig, GeminiBackend, ToolManager};
//!
//! # async fn example() -> Result<(), runtime::ModelError> {
//! let backend = Arc::new(GeminiBackend::builder("api-key", runtime::DEFAULT_MODEL).build()?);
//! let tools = ToolManager::with_builtin_tools(&BuiltinConfig::default(), backend.clone());
//! let agent = Agent::new(backend, tools);
//! println!("{}", agent.answer("What is 25 * 4?").await);
//! # Ok(())
//! # }
//! ```

mod agent;
pub mod model;
pub mod providers;
mod session;
#[cfg(test)]
mod testing;
pub mod tools;

pub use agent::{Agent, NO_ANSWER, describe_builtin_tools};
pub use model::{Backend, Message, ModelError, Part, Role, ToolCall, ToolSpec, Usage};
pub use providers::{DEFAULT_MODEL, GeminiBackend, GeminiBackendBuilder};
pub use session::{NO_TEXT, Session};
pub use tools::{BuiltinConfig, Tool, ToolArgs, ToolError, ToolManager, ToolResult};
