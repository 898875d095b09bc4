pub mod handler;

pub use handler::{consume_chat_stream, StreamOutput};
