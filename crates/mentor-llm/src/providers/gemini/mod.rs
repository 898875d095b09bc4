//! Google Gemini / Imagen gateway over the public REST API.

mod request;
mod stream;

pub use request::{build_chat_body, build_contents};
pub use stream::{parse_gemini_response, parse_gemini_sse_event, GeminiStreamState};

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::error::{LLMError, Result};
use crate::gateway::ModelGateway;
use crate::guard::guarded;
use crate::http::{base_client, retrying_client, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
use crate::prompts;
use crate::providers::common::sse::chat_stream_from_sse;
use crate::types::{
    ChatRequest, ChatStream, CodeSuggestionRequest, ImagePromptRequest, ImageRequest,
    PlannedStep, PlannedToolCall, PromptIntent, TaskPlanRequest,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Google Gemini API gateway.
pub struct GeminiGateway {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
    timeout: Duration,
}

impl GeminiGateway {
    /// Create a gateway with an API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: retrying_client(base_client(), DEFAULT_MAX_RETRIES),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom base URL (e.g., for proxies or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.client = retrying_client(base_client(), max_retries);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_string))
            .unwrap_or(text);

        if status == 401 || status == 403 {
            return Err(LLMError::Auth(format!(
                "Gemini authentication failed: {}",
                message
            )));
        }
        Err(LLMError::Api(format!(
            "Gemini API error: HTTP {}: {}",
            status, message
        )))
    }

    /// Non-streaming `generateContent`, returning the concatenated text parts.
    async fn generate_text(&self, contents: Value, generation_config: Option<Value>) -> Result<String> {
        let mut body = json!({ "contents": contents });
        if let Some(config) = generation_config {
            body["generationConfig"] = config;
        }

        let response = self
            .post(&self.url(&self.model, "generateContent"), &body)
            .await?;
        let value: Value = response.json().await?;

        let chunk = parse_gemini_response(&mut GeminiStreamState::default(), &value)?;
        if chunk.text.trim().is_empty() {
            return Err(LLMError::InvalidResponse(
                "The model returned no text.".to_string(),
            ));
        }
        Ok(chunk.text)
    }

    async fn generate_json<T: DeserializeOwned>(&self, prompt: String, schema: Value) -> Result<T> {
        let text = self
            .generate_text(
                text_contents(&prompt),
                Some(json!({
                    "responseMimeType": "application/json",
                    "responseSchema": schema,
                })),
            )
            .await?;
        serde_json::from_str(prompts::strip_code_fences(&text).as_str())
            .map_err(|e| LLMError::InvalidResponse(format!("Malformed JSON from model: {e}")))
    }
}

fn text_contents(prompt: &str) -> Value {
    json!([{ "role": "user", "parts": [{ "text": prompt }] }])
}

#[derive(Deserialize)]
struct SuggestionList {
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(default)]
    plan: Vec<RawPlanStep>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlanStep {
    description: String,
    #[serde(default)]
    tool_call: Option<RawToolCall>,
}

#[derive(Deserialize)]
struct RawToolCall {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

impl RawPlanStep {
    fn into_planned(self) -> PlannedStep {
        let tool_call = match self.tool_call {
            Some(call) if !call.name.trim().is_empty() => {
                let args = match call.arguments.as_deref().map(str::trim) {
                    None | Some("") => json!({}),
                    Some(raw) => serde_json::from_str::<Value>(raw)
                        .ok()
                        .filter(Value::is_object)
                        .unwrap_or_else(|| {
                            log::warn!(
                                "Plan step '{}' has unparseable arguments, keeping raw text",
                                self.description
                            );
                            Value::String(raw.to_string())
                        }),
                };
                Some(PlannedToolCall {
                    name: call.name,
                    args,
                })
            }
            _ => None,
        };
        PlannedStep {
            description: self.description,
            tool_call,
        }
    }
}

fn plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "plan": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "toolCall": {
                            "type": "OBJECT",
                            "properties": {
                                "name": { "type": "STRING" },
                                "arguments": { "type": "STRING" }
                            }
                        }
                    },
                    "required": ["description"]
                }
            }
        }
    })
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream> {
        let body = build_chat_body(request);
        let url = format!("{}?alt=sse", self.url(&self.model, "streamGenerateContent"));

        log::debug!(
            "Gemini chat request: {} messages, {} tools, persona '{}'",
            request.history.len(),
            request.tools.len(),
            request.persona.id
        );

        let response = guarded("chat_stream", cancel, self.timeout, self.post(&url, &body)).await?;

        let mut state = GeminiStreamState::default();
        Ok(chat_stream_from_sse(response, move |event, data| {
            parse_gemini_sse_event(&mut state, event, data)
        }))
    }

    async fn generate_images(
        &self,
        request: &ImageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let body = json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": {
                "sampleCount": request.number_of_images.max(1),
                "aspectRatio": request.aspect_ratio,
                "outputMimeType": "image/jpeg",
            }
        });
        let url = self.url(&self.image_model, "predict");

        guarded("generate_images", cancel, self.timeout, async {
            let value: Value = self.post(&url, &body).await?.json().await?;
            let images: Vec<String> = value
                .get("predictions")
                .and_then(|p| p.as_array())
                .map(|predictions| {
                    predictions
                        .iter()
                        .filter_map(|p| p.get("bytesBase64Encoded")?.as_str())
                        .map(|bytes| format!("data:image/jpeg;base64,{bytes}"))
                        .collect()
                })
                .unwrap_or_default();

            if images.is_empty() {
                return Err(LLMError::Api(
                    "Failed to generate image. The model might have refused the prompt for safety reasons."
                        .to_string(),
                ));
            }
            Ok(images)
        })
        .await
    }

    async fn code_suggestion(
        &self,
        request: &CodeSuggestionRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let prompt = prompts::code_suggestion_prompt(
            request.action,
            &request.language,
            &request.code,
            request.framework.as_deref(),
        );
        let text = guarded(
            "code_suggestion",
            cancel,
            self.timeout,
            self.generate_text(text_contents(&prompt), None),
        )
        .await?;
        Ok(prompts::strip_code_fences(&text))
    }

    async fn workspace_analysis(
        &self,
        file_list: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } }
            }
        });
        let list: SuggestionList = guarded(
            "workspace_analysis",
            cancel,
            self.timeout,
            self.generate_json(prompts::workspace_analysis_prompt(file_list), schema),
        )
        .await?;
        Ok(list.suggestions)
    }

    async fn task_plan(
        &self,
        request: &TaskPlanRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlannedStep>> {
        let raw: RawPlan = guarded(
            "task_plan",
            cancel,
            self.timeout,
            self.generate_json(
                prompts::task_plan_prompt(&request.goal, &request.tools),
                plan_schema(),
            ),
        )
        .await?;
        Ok(raw.plan.into_iter().map(RawPlanStep::into_planned).collect())
    }

    async fn generate_widget(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let text = guarded(
            "generate_widget",
            cancel,
            self.timeout,
            self.generate_text(text_contents(&prompts::widget_prompt(prompt)), None),
        )
        .await?;
        Ok(prompts::strip_code_fences(&text))
    }

    async fn image_prompt(
        &self,
        request: &ImagePromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let contents = json!([{
            "role": "user",
            "parts": [
                { "inlineData": { "mimeType": request.image.mime_type, "data": request.image.data } },
                { "text": prompts::image_edit_prompt(&request.modification_prompt) }
            ]
        }]);
        let text = guarded(
            "image_prompt",
            cancel,
            self.timeout,
            self.generate_text(contents, None),
        )
        .await?;
        Ok(text.trim().to_string())
    }

    async fn classify_intent(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<PromptIntent> {
        let answer = guarded(
            "classify_intent",
            cancel,
            self.timeout,
            self.generate_text(
                text_contents(&prompts::classify_intent_prompt(prompt)),
                Some(json!({ "temperature": 0 })),
            ),
        )
        .await?;
        Ok(PromptIntent::from_model_answer(&answer))
    }
}
