use std::time::Duration;

use mentor_llm::http::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
use mentor_llm::providers::gemini::{DEFAULT_IMAGE_MODEL, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 3000;
/// Largest accepted request body; chat history may carry inline images.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Upstream credential. Without it every model route answers 503.
    pub api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub model: String,
    pub image_model: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            gemini_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ServerConfig {
    /// Treats a blank key as absent.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }
}
