//! Gateway that talks to the MentorX proxy server (`/api/*`) instead of the
//! model vendor directly. This is what the client uses; the API key never
//! leaves the server.

use std::time::Duration;

use async_trait::async_trait;
use mentor_core::ClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{LLMError, Result};
use crate::gateway::ModelGateway;
use crate::guard::guarded;
use crate::http::{base_client, retrying_client, DEFAULT_MAX_RETRIES};
use crate::providers::common::sse::chat_stream_from_sse;
use crate::types::{
    ChatFrame, ChatRequest, ChatStream, ClassifyIntentRequest, ClassifyIntentResponse,
    CodeSuggestionRequest, CodeSuggestionResponse, ImagePromptRequest, ImagePromptResponse,
    ImageRequest, ImageResponse, PlannedStep, PromptIntent, TaskPlanRequest, TaskPlanResponse,
    WidgetRequest, WidgetResponse, WorkspaceAnalysisRequest, WorkspaceAnalysisResponse,
};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct BackendGateway {
    client: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
}

impl BackendGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: retrying_client(base_client(), DEFAULT_MAX_RETRIES),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: crate::http::DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.backend_url)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.client = retrying_client(base_client(), max_retries);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/api/{}", self.base_url, route)
    }

    async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        route: &str,
        body: &B,
        accept_sse: bool,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.post(self.endpoint(route)).json(body);
        if accept_sse {
            request = request.header(reqwest::header::ACCEPT, "text/event-stream");
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("Server error: {}", status));

        log::warn!("POST /api/{} failed with {}: {}", route, status, message);
        match status.as_u16() {
            401 | 403 => Err(LLMError::Auth(message)),
            503 => Err(LLMError::NotConfigured(message)),
            _ => Err(LLMError::Api(message)),
        }
    }

    async fn post_json<B, R>(&self, route: &str, body: &B, cancel: &CancellationToken) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        guarded(route, cancel, self.timeout, async {
            let response = self.send(route, body, false).await?;
            Ok(response.json::<R>().await?)
        })
        .await
    }
}

fn parse_chat_frame(data: &str) -> Result<Option<crate::types::ChatChunk>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }
    match serde_json::from_str::<ChatFrame>(data)
        .map_err(|e| LLMError::Stream(format!("Failed to parse chat frame: {}", e)))?
    {
        ChatFrame::Error { message, .. } => Err(LLMError::Api(message)),
        ChatFrame::Chunk(chunk) if chunk.is_empty() => Ok(None),
        ChatFrame::Chunk(chunk) => Ok(Some(chunk)),
    }
}

#[async_trait]
impl ModelGateway for BackendGateway {
    async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream> {
        let response = guarded("chat", cancel, self.timeout, self.send("chat", request, true)).await?;
        Ok(chat_stream_from_sse(response, |_event, data| {
            parse_chat_frame(data)
        }))
    }

    async fn generate_images(
        &self,
        request: &ImageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let response: ImageResponse = self.post_json("image", request, cancel).await?;
        Ok(response.images)
    }

    async fn code_suggestion(
        &self,
        request: &CodeSuggestionRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response: CodeSuggestionResponse =
            self.post_json("code-suggestion", request, cancel).await?;
        Ok(response.suggestion)
    }

    async fn workspace_analysis(
        &self,
        file_list: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let request = WorkspaceAnalysisRequest {
            file_list: file_list.to_vec(),
        };
        let response: WorkspaceAnalysisResponse =
            self.post_json("workspace-analysis", &request, cancel).await?;
        Ok(response.suggestions)
    }

    async fn task_plan(
        &self,
        request: &TaskPlanRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlannedStep>> {
        let response: TaskPlanResponse = self.post_json("task-plan", request, cancel).await?;
        Ok(response.plan)
    }

    async fn generate_widget(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let request = WidgetRequest {
            prompt: prompt.to_string(),
        };
        let response: WidgetResponse = self.post_json("widget", &request, cancel).await?;
        Ok(response.jsx)
    }

    async fn image_prompt(
        &self,
        request: &ImagePromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response: ImagePromptResponse = self.post_json("image-prompt", request, cancel).await?;
        Ok(response.prompt)
    }

    async fn classify_intent(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<PromptIntent> {
        let request = ClassifyIntentRequest {
            prompt: prompt.to_string(),
        };
        let response: ClassifyIntentResponse =
            self.post_json("classify-intent", &request, cancel).await?;
        Ok(response.intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> BackendGateway {
        BackendGateway::new(server.uri()).with_max_retries(0)
    }

    #[tokio::test]
    async fn posts_widget_prompt_and_reads_jsx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/widget"))
            .and(body_json(json!({"prompt": "a clock"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsx": "<div/>"})))
            .mount(&server)
            .await;

        let jsx = gateway(&server)
            .generate_widget("a clock", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(jsx, "<div/>");
    }

    #[tokio::test]
    async fn error_body_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/image"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "Failed to generate image. The model might have refused the prompt for safety reasons."
            })))
            .mount(&server)
            .await;

        let error = gateway(&server)
            .generate_images(&ImageRequest::new("x"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, LLMError::Api(msg) if msg.starts_with("Failed to generate image")));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": "Service Unavailable: The server is missing the required API_KEY configuration."
            })))
            .mount(&server)
            .await;

        let error = gateway(&server)
            .classify_intent("hello", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, LLMError::NotConfigured(_)));
        assert!(error.user_message().contains("API_KEY"));
    }

    #[tokio::test]
    async fn unparseable_error_body_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let error = gateway(&server)
            .workspace_analysis(&["a.js".to_string()], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, LLMError::Api(msg) if msg.starts_with("Server error: 502")));
    }

    #[tokio::test]
    async fn chat_stream_reads_frames_and_in_band_errors() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"text\":\"Hel\"}\n\n",
            "data: {\"text\":\"lo\"}\n\n",
            "data: {\"error\":true,\"message\":\"Quota exceeded\"}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("accept", "text/event-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let request = ChatRequest {
            history: vec![mentor_core::Message::user("hi")],
            persona: mentor_core::persona::default_persona(),
            is_web_access_enabled: false,
            is_cost_saver_mode: false,
            is_deep_analysis: false,
            custom_instruction: String::new(),
            model_params: Default::default(),
            tools: Vec::new(),
        };
        let mut stream = gateway(&server)
            .chat_stream(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap().text, "Hel");
        assert_eq!(stream.next().await.unwrap().unwrap().text, "lo");
        match stream.next().await {
            Some(Err(LLMError::Api(message))) => assert_eq!(message, "Quota exceeded"),
            other => panic!("expected in-band error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let server = MockServer::start().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = gateway(&server)
            .generate_widget("x", &cancel)
            .await
            .unwrap_err();
        assert!(error.is_cancelled());
    }
}
