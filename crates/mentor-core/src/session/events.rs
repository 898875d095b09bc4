use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::tools::ToolResult;

/// Progress notifications published while a session is working.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Token {
        content: String,
    },

    ToolStart {
        tool_call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    ToolComplete {
        tool_call_id: String,
        result: ToolResult,
    },

    ToolError {
        tool_call_id: String,
        error: String,
    },

    /// Snapshot of the task after every state transition.
    TaskUpdated {
        task: Task,
    },

    Complete {
        message_id: String,
    },

    Error {
        message: String,
    },
}
