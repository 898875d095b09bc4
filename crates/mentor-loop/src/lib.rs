//! Task orchestration and conversation handling on top of the tool layer.
//!
//! [`TaskOrchestrator`] turns a goal into a plan and runs it step by step;
//! [`ConversationManager`] owns the sessions and routes every user input to
//! chat, image generation, the widget factory, a slash command or a task.

pub mod config;
pub mod conversation;
pub mod events;
pub mod orchestrator;
pub mod stream;
mod tokens;

pub use config::LoopConfig;
pub use conversation::{
    classify_input, export_markdown, CodeActionOutcome, ConversationManager, Intent,
    SlashCommand, WorkspaceCodeAction,
};
pub use events::EventSink;
pub use orchestrator::TaskOrchestrator;
