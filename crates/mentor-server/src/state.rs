use std::sync::Arc;

use mentor_llm::{GeminiGateway, ModelGateway};

use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    gateway: Option<Arc<dyn ModelGateway>>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway: Some(gateway),
        }
    }

    /// State of a server started without an upstream credential.
    pub fn unconfigured() -> Self {
        Self { gateway: None }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let Some(api_key) = config.api_key.as_deref() else {
            log::warn!("API_KEY is not set; model routes will answer 503");
            return Self::unconfigured();
        };

        let mut gateway = GeminiGateway::new(api_key)
            .with_model(config.model.clone())
            .with_image_model(config.image_model.clone())
            .with_timeout(config.request_timeout)
            .with_max_retries(config.max_retries);
        if let Some(base_url) = &config.gemini_base_url {
            gateway = gateway.with_base_url(base_url.clone());
        }
        Self::new(Arc::new(gateway))
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn gateway(&self) -> Result<Arc<dyn ModelGateway>, ApiError> {
        self.gateway.clone().ok_or(ApiError::MissingApiKey)
    }
}
