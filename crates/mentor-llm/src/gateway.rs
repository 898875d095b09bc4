use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{
    ChatRequest, ChatStream, CodeSuggestionRequest, ImagePromptRequest, ImageRequest,
    PlannedStep, PromptIntent, TaskPlanRequest,
};

/// The only boundary that talks to the hosted model.
///
/// Every call takes the caller's cancellation token; a cancelled token makes
/// the call return [`crate::LLMError::Cancelled`] without waiting for the
/// remote side.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream>;

    /// Returns `data:` URLs.
    async fn generate_images(
        &self,
        request: &ImageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>>;

    /// Raw code only, fences stripped.
    async fn code_suggestion(
        &self,
        request: &CodeSuggestionRequest,
        cancel: &CancellationToken,
    ) -> Result<String>;

    async fn workspace_analysis(
        &self,
        file_list: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>>;

    async fn task_plan(
        &self,
        request: &TaskPlanRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlannedStep>>;

    async fn generate_widget(&self, prompt: &str, cancel: &CancellationToken) -> Result<String>;

    async fn image_prompt(
        &self,
        request: &ImagePromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String>;

    async fn classify_intent(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<PromptIntent>;
}
