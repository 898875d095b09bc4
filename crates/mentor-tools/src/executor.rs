use async_trait::async_trait;
use mentor_core::{ToolCall, ToolCatalog, ToolError, ToolResult, ToolSchema};
use serde_json::Value;

use crate::context::ToolContext;
use crate::registry::{normalize_tool_name, ToolRegistry};
use crate::tools::{
    CreateFileTool, CreateWidgetTool, GenerateTestFileTool, ListFilesTool, UpdateFileTool,
    UpdateWidgetTool,
};
use crate::validation::validate_arguments;

pub type Result<T> = std::result::Result<T, ToolError>;

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult>;
    fn list_tools(&self) -> Vec<ToolSchema>;
}

/// Empty or whitespace arguments mean "no arguments".
pub fn parse_tool_args(arguments: &str) -> Result<Value> {
    match arguments.trim() {
        "" => Ok(Value::Object(Default::default())),
        raw => serde_json::from_str(raw).map_err(|error| {
            ToolError::InvalidArguments(format!("arguments are not valid JSON: {error}"))
        }),
    }
}

/// The registry of tools offered for a persona's catalog.
pub fn catalog_for(catalog: ToolCatalog) -> ToolRegistry {
    let registry = ToolRegistry::new();
    let registered = match catalog {
        ToolCatalog::None => Ok(()),
        ToolCatalog::Workspace => registry
            .register(CreateFileTool)
            .and_then(|_| registry.register(UpdateFileTool))
            .and_then(|_| registry.register(ListFilesTool))
            .and_then(|_| registry.register(GenerateTestFileTool)),
        ToolCatalog::Widgets => registry
            .register(CreateWidgetTool)
            .and_then(|_| registry.register(UpdateWidgetTool)),
    };
    if let Err(error) = registered {
        log::error!("Failed to build tool catalog {:?}: {}", catalog, error);
    }
    registry
}

/// Validates calls against the registry and applies them to the session in
/// the [`ToolContext`].
pub struct WorkspaceToolExecutor {
    registry: ToolRegistry,
}

impl WorkspaceToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn for_catalog(catalog: ToolCatalog) -> Self {
        Self::new(catalog_for(catalog))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[async_trait]
impl ToolExecutor for WorkspaceToolExecutor {
    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult> {
        let name = normalize_tool_name(&call.function.name);
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let args = parse_tool_args(&call.function.arguments)?;
        validate_arguments(&tool.parameters_schema(), &args)?;

        log::debug!("Executing tool {} ({})", name, call.id);
        let result = tool.execute(args, ctx).await;
        match &result {
            Ok(outcome) => log::info!("Tool {} succeeded: {}", name, outcome.summary),
            Err(error) => log::warn!("Tool {} failed: {}", name, error),
        }
        result
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        self.registry.list_tools()
    }
}
