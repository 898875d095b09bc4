use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use mentor_core::{FunctionSchema, ToolError, ToolResult, ToolSchema};
use serde_json::Value;
use thiserror::Error;

use crate::context::ToolContext;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;

    /// Runs with arguments that already passed [`crate::validate_arguments`].
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError>;

    /// Function declaration sent with chat and planning requests.
    fn to_schema(&self) -> ToolSchema {
        let function = FunctionSchema {
            name: self.name().into(),
            description: self.description().into(),
            parameters: self.parameters_schema(),
        };
        ToolSchema {
            schema_type: "function".into(),
            function,
        }
    }
}

/// Raised while assembling a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("'{0}' is offered twice in the same catalog")]
    Duplicate(String),

    #[error("a catalog tool needs a name")]
    Unnamed,
}

/// Tools of one catalog, keyed by their bare name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let key = tool.name().trim().to_string();
        if key.is_empty() {
            return Err(RegistryError::Unnamed);
        }
        match self.tools.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(tool));
                Ok(())
            }
            Entry::Occupied(taken) => Err(RegistryError::Duplicate(taken.key().clone())),
        }
    }

    /// Looks a tool up by bare or namespaced name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .get(normalize_tool_name(name))
            .map(|found| found.value().clone())
    }

    /// Declarations offered to the model, ordered by name.
    pub fn list_tools(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.iter().map(|t| t.value().to_schema()).collect();
        schemas.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        schemas
    }

    pub fn list_tool_names(&self) -> Vec<String> {
        self.list_tools()
            .into_iter()
            .map(|schema| schema.function.name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// `default::createFile` -> `createFile`.
pub fn normalize_tool_name(name: &str) -> &str {
    let name = name.trim();
    name.rsplit("::").next().unwrap_or(name)
}
