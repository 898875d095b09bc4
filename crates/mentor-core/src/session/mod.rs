pub mod error;
pub mod events;
pub mod store;
pub mod types;

pub use error::SessionError;
pub use events::SessionEvent;
pub use store::{SessionHandle, SessionStore, SessionSummary};
pub use types::{
    Attachment, Message, ModelParams, Role, Session, Source, ToolResponse, DEFAULT_SESSION_TITLE,
};
