//! Tool trait.

use super::{ToolArgs, ToolError, ToolSchema};
use async_trait::async_trait;
use serde_json::Value;

/// A named, schema-described function the model may ask to run.
///
/// Arguments passed to [`Tool::execute`] have already been validated against
/// [`Tool::schema`] and have defaults applied. `question` is the user's full
/// question, for tools that phrase or search with it.
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> &ToolSchema;

    fn name(&self) -> &str {
        self.schema().name
    }

    async fn execute(&self, args: &ToolArgs, question: &str) -> Result<Value, ToolError>;
}
