use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Service unavailable: {0}")]
    NotConfigured(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LLMError>;

impl LLMError {
    /// Short text suitable for showing in the conversation.
    pub fn user_message(&self) -> String {
        match self {
            LLMError::Http(_) | LLMError::Middleware(_) => {
                "Could not reach the model service. Check your connection and try again.".to_string()
            }
            LLMError::Json(_) | LLMError::InvalidResponse(_) | LLMError::Stream(_) => {
                "The model returned a response that could not be understood. Please try again."
                    .to_string()
            }
            LLMError::Api(message) | LLMError::NotConfigured(message) => message.clone(),
            LLMError::Auth(_) => "The model service rejected the credentials.".to_string(),
            LLMError::Timeout { .. } => {
                "The model took too long to respond. Please try again.".to_string()
            }
            LLMError::Cancelled => "Generation stopped.".to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LLMError::Cancelled)
    }
}
