pub mod backend;
pub mod common;
pub mod gemini;

pub use backend::BackendGateway;
pub use gemini::GeminiGateway;
