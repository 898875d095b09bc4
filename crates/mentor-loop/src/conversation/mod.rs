mod commands;
mod export;
mod intent;
mod manager;

pub use commands::{CodeActionOutcome, WorkspaceCodeAction};
pub use export::export_markdown;
pub use intent::{classify_input, mentions_images, Intent, SlashCommand};
pub use manager::ConversationManager;
