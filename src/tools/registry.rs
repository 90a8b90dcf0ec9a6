// Tool registry
//
// Owns the set of tools the model may call, in registration order. Execution
// through the registry never fails: unknown names, missing arguments, tool
// errors and panics all come back as failed ToolResults.

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::error::ToolError;
use super::types::{Disposition, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};

/// Capability interface implemented by every tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call the tool
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_schema(&self) -> ToolInputSchema;

    /// Default permission disposition; mutating tools keep `Ask`
    fn disposition(&self) -> Disposition {
        Disposition::Ask
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Ordered, name-unique collection of tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six built-in tools
    pub fn with_defaults() -> Self {
        use super::implementations::*;

        let mut registry = Self::new();
        registry.register(ReadFileTool);
        registry.register(WriteFileTool);
        registry.register(EditFileTool);
        registry.register(GlobTool);
        registry.register(GrepTool);
        registry.register(BashTool);
        registry
    }

    /// Add a tool, replacing any earlier tool with the same name in place
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => {
                debug!(tool = tool.name(), "Replacing registered tool");
                self.tools[index] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Declarative descriptors advertised to the model, in registration order
    pub fn schemas(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    #[instrument(skip(self, input, context), fields(tool = %name))]
    pub async fn execute(&self, name: &str, input: &Value, context: &ToolContext) -> ToolResult {
        let Some(tool) = self.lookup(name) else {
            warn!("Unknown tool requested");
            return ToolResult::failure(format!("Unknown tool: {}", name));
        };

        let missing = tool.input_schema().missing_required(input).join(", ");
        if !missing.is_empty() {
            return ToolError::Validation(format!("Missing required parameter(s): {}", missing))
                .into();
        }

        let outcome = AssertUnwindSafe(tool.execute(input, context))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(output)) => {
                debug!("Tool executed successfully");
                ToolResult::ok(output)
            }
            Ok(Err(e)) => {
                warn!("Tool failed: {}", e);
                e.into()
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!("Tool panicked: {}", message);
                ToolResult::failure(format!("Tool '{}' crashed: {}", name, message))
            }
        }
    }
}
