//! HTTP backend of MentorX: a thin proxy exposing the model gateway under
//! `/api/*`, with one server-sent-events route for streamed chat.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{app_config, run_server};
pub use state::AppState;
