//! Single-turn question answering.

use std::sync::Arc;

use tracing::debug;

use crate::model::{Backend, Message, ModelError, ModelRequest, ToolSpec};
use crate::tools::{ToolArgs, ToolKind, ToolManager};

/// Reply used when the model returns neither text nor a tool call.
pub const NO_ANSWER: &str = "Sorry, I couldn't process that request.";

/// Answers one question per call, without memory.
///
/// When the model asks for a tool, the tool's own output (or error message)
/// is the answer.
pub struct Agent<B> {
    backend: Arc<B>,
    tools: ToolManager,
    specs: Vec<ToolSpec>,
}

impl<B: Backend> Agent<B> {
    pub fn new(backend: Arc<B>, tools: ToolManager) -> Self {
        let specs = tools.specs();
        Self {
            backend,
            tools,
            specs,
        }
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Answer a question. Provider failures come back as `Error: <message>`.
    pub async fn answer(&self, question: &str) -> String {
        match self.try_answer(question).await {
            Ok(answer) => answer,
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn try_answer(&self, question: &str) -> Result<String, ModelError> {
        let messages = [Message::user(question)];
        let response = self
            .backend
            .call(ModelRequest {
                messages: &messages,
                tools: &self.specs,
            })
            .await?;

        if let Some(call) = response.message.first_tool_call() {
            debug!(tool = %call.name, args = %call.args, "model requested tool");
            let result = self
                .tools
                .execute(&call.name, ToolArgs::from(call.args.clone()), question)
                .await;
            return Ok(result.to_text());
        }

        let text = response.message.text();
        if text.trim().is_empty() {
            Ok(NO_ANSWER.to_string())
        } else {
            Ok(text)
        }
    }

    /// Human-readable list of the registered tools.
    pub fn list_available_tools(&self) -> String {
        describe_tools(&self.tools)
    }
}

pub(crate) fn describe_tools(tools: &ToolManager) -> String {
    describe(tools.list())
}

/// The builtin tool listing, read from the schema table without building
/// any tool.
pub fn describe_builtin_tools() -> String {
    describe(
        ToolKind::ALL
            .iter()
            .map(|kind| (kind.schema().name, kind.schema().description)),
    )
}

fn describe<'a>(tools: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let lines: Vec<String> = tools
        .into_iter()
        .map(|(name, description)| format!("- {name}: {description}"))
        .collect();
    format!("Available tools:\n{}", lines.join("\n"))
}
