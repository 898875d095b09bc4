pub mod error;
pub mod types;

pub use error::ToolError;
pub use types::{FunctionCall, FunctionSchema, ToolCall, ToolResult, ToolSchema};
