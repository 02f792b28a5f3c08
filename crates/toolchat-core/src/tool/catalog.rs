//! Tool trait and the ToolCatalog registry.
//!
//! Same blanket-impl shape as the provider wrappers:
//! 1. `Tool` uses RPITIT for `execute`
//! 2. `ToolDyn` is the object-safe twin with a boxed future
//! 3. `ToolCatalog` stores `Arc<dyn ToolDyn>` and dispatches by name

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use toolchat_types::error::ToolError;
use toolchat_types::tool::{ToolDefinition, ToolOutput};
use tracing::{info, warn};

/// A callable tool offered to the model.
///
/// Implementations live in toolchat-infra (e.g., `WeatherTool`). Upstream
/// API failures are reported as `Ok(ToolOutput::Failure)` so the model can
/// explain them; `Err` is reserved for calls that could not run at all.
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    fn execute(&self, arguments: Value) -> impl Future<Output = Result<ToolOutput, ToolError>> + Send;
}

/// Object-safe version of [`Tool`].
pub trait ToolDyn: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    fn execute_boxed<'a>(
        &'a self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>>;
}

impl<T: Tool> ToolDyn for T {
    fn definition(&self) -> &ToolDefinition {
        Tool::definition(self)
    }

    fn execute_boxed<'a>(
        &'a self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>> {
        Box::pin(self.execute(arguments))
    }
}

/// Registered tools, in registration order.
#[derive(Default, Clone)]
pub struct ToolCatalog {
    tools: Vec<Arc<dyn ToolDyn>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = Tool::definition(&tool).name.clone();
        self.tools.retain(|t| t.definition().name != name);
        self.tools.push(Arc::new(tool));
    }

    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name.
    ///
    /// Never fails: an unknown tool or a call that could not run becomes an
    /// error-shaped output the model can read.
    pub async fn execute(&self, name: &str, arguments: Value) -> ToolOutput {
        let Some(tool) = self.tools.iter().find(|t| t.definition().name == name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return ToolOutput::failure(ToolError::UnknownTool(name.to_string()).to_string());
        };

        match tool.execute_boxed(arguments).await {
            Ok(output) => {
                info!(tool = name, is_error = output.is_error(), "Tool executed");
                output
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolOutput::failure(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| &t.definition().name))
            .finish()
    }
}
