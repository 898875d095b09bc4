use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mentor_llm::LLMError;
use serde::Serialize;
use thiserror::Error;

pub const MISSING_API_KEY_MESSAGE: &str =
    "Service Unavailable: The server is missing the required API_KEY configuration.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Gateway(#[from] LLMError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// The text placed in the `{error}` body.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::MissingApiKey => MISSING_API_KEY_MESSAGE.to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Gateway(error) => error.user_message(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Gateway(LLMError::NotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Gateway(error) = self {
            log::error!("Gateway call failed: {}", error);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.public_message(),
        })
    }
}
