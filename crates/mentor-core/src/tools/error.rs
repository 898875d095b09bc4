use thiserror::Error;

use crate::widget::WidgetError;
use crate::workspace::WorkspaceError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0} not found")]
    TargetNotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Cancelled")]
    Cancelled,
}

impl ToolError {
    /// Validation failures are rejected before any state is touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, ToolError::NotFound(_) | ToolError::InvalidArguments(_))
    }
}

impl From<WorkspaceError> for ToolError {
    fn from(error: WorkspaceError) -> Self {
        match error {
            WorkspaceError::FileExists(name) => ToolError::AlreadyExists(format!("File '{name}'")),
            WorkspaceError::FileNotFound(name) => {
                ToolError::TargetNotFound(format!("File '{name}'"))
            }
            WorkspaceError::InvalidName(reason) => ToolError::InvalidArguments(reason),
        }
    }
}

impl From<WidgetError> for ToolError {
    fn from(error: WidgetError) -> Self {
        match error {
            WidgetError::NotFound(id) => ToolError::TargetNotFound(format!("Widget '{id}'")),
        }
    }
}
