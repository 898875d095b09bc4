//! Model gateway for MentorX.
//!
//! [`ModelGateway`] is the single seam through which the rest of the
//! workspace reaches a language model. Two implementations ship here:
//! [`GeminiGateway`] calls Google's API directly (used by the proxy server)
//! and [`BackendGateway`] calls the proxy's `/api/*` routes (used by clients).

pub mod error;
pub mod gateway;
pub mod guard;
pub mod http;
pub mod prompts;
pub mod providers;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{LLMError, Result};
pub use gateway::ModelGateway;
pub use guard::guarded;
pub use providers::{BackendGateway, GeminiGateway};
pub use types::*;
