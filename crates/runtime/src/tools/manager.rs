//! Tool registration and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::builtin::{self, BuiltinConfig};
use super::{Tool, ToolArgs, ToolError, ToolKind, ToolResult};
use crate::model::{Backend, ToolSpec};

/// Registry of tools, keyed by name.
///
/// Tools are listed in the order they were first registered. Registering a
/// name again replaces the tool in place.
#[derive(Default)]
pub struct ToolManager {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
}

impl ToolManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager holding every builtin tool.
    ///
    /// A builtin that fails to construct is logged and skipped.
    pub fn with_builtin_tools<B: Backend + 'static>(
        config: &BuiltinConfig,
        backend: Arc<B>,
    ) -> Self {
        Self::from_constructed(
            ToolKind::ALL
                .into_iter()
                .map(|kind| (kind.schema().name, builtin::construct(kind, config, &backend))),
        )
    }

    /// Register constructed tools in order, skipping the ones that failed.
    fn from_constructed(
        constructed: impl IntoIterator<Item = (&'static str, Result<Box<dyn Tool>, ToolError>)>,
    ) -> Self {
        let mut manager = Self::new();
        for (name, tool) in constructed {
            match tool {
                Ok(tool) => {
                    info!(tool = tool.name(), "registered tool");
                    manager.register(tool);
                }
                Err(e) => {
                    warn!(tool = name, error = %e, "failed to construct tool, skipping");
                }
            }
        }
        manager
    }

    /// Register a tool. The last registration for a name wins.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.order.iter().filter_map(|name| self.get(name))
    }

    /// Name and description of every tool.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.iter()
            .map(|tool| (tool.name(), tool.schema().description))
            .collect()
    }

    /// Function declarations for every tool.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.iter().map(|tool| tool.schema().spec()).collect()
    }

    /// Validate and run a tool.
    ///
    /// Never fails: unknown tools, invalid arguments, and tool errors all
    /// come back as [`ToolResult::Failure`].
    pub async fn execute(&self, name: &str, mut args: ToolArgs, question: &str) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::Failure {
                error: ToolError::NotFound(name.to_string()),
            };
        };

        let schema = tool.schema();
        if let Err(error) = schema.validate(&args) {
            debug!(tool = name, error = %error, "tool arguments rejected");
            return ToolResult::Failure { error };
        }
        schema.apply_defaults(&mut args);

        debug!(tool = name, args = ?args.0, "executing tool");
        let result = ToolResult::from(tool.execute(&args, question).await);
        if let Some(error) = result.error() {
            debug!(tool = name, error = %error, "tool failed");
        }
        result
    }
}
