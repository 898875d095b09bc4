//! Tool invocation layer: the fixed catalog of tools the model may call,
//! their argument schemas, and the executor that validates and applies
//! calls against a session's workspace and widgets.

pub mod context;
pub mod executor;
pub mod registry;
pub mod tools;
pub mod validation;

pub use context::ToolContext;
pub use executor::{catalog_for, parse_tool_args, ToolExecutor, WorkspaceToolExecutor};
pub use registry::{normalize_tool_name, RegistryError, Tool, ToolRegistry};
pub use validation::validate_arguments;

pub use mentor_core::{ToolCall, ToolError, ToolResult, ToolSchema};
