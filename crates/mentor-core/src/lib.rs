pub mod cache;
pub mod config;
pub mod dashboard;
pub mod persona;
pub mod session;
pub mod task;
pub mod tools;
pub mod widget;
pub mod workspace;

pub use cache::EfficiencyStats;
pub use config::ClientConfig;
pub use dashboard::DashboardPins;
pub use persona::{Persona, ToolCatalog};
pub use session::{
    Attachment, Message, ModelParams, Role, Session, SessionError, SessionEvent, SessionHandle,
    SessionStore, Source, ToolResponse,
};
pub use task::{StepStatus, Task, TaskStatus, TaskStep};
pub use tools::{FunctionCall, FunctionSchema, ToolCall, ToolError, ToolResult, ToolSchema};
pub use widget::{AiWidget, WidgetCollection, WidgetError};
pub use workspace::{CodeFile, RunOutcome, WorkspaceError, WorkspaceState};
