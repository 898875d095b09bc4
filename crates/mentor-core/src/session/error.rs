use thiserror::Error;

use crate::widget::WidgetError;
use crate::workspace::WorkspaceError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Only user messages can be edited")]
    NotEditable,

    #[error("No task to resume")]
    NoResumableTask,

    #[error("No active file")]
    NoActiveFile,

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error("Model error: {0}")]
    Gateway(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Cancelled")]
    Cancelled,
}
