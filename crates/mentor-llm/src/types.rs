//! Request and response bodies of the `/api/*` surface.
//!
//! Field names are camelCase on the wire.

use std::pin::Pin;

use futures::Stream;
use mentor_core::{Message, ModelParams, Persona, Source, TaskStep, ToolCall, ToolSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub history: Vec<Message>,
    pub persona: Persona,
    #[serde(default)]
    pub is_web_access_enabled: bool,
    #[serde(default)]
    pub is_cost_saver_mode: bool,
    #[serde(default)]
    pub is_deep_analysis: bool,
    #[serde(default)]
    pub custom_instruction: String,
    #[serde(default)]
    pub model_params: ModelParams,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One partial piece of a streamed reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatChunk {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ChatChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.sources.is_empty()
            && self.tool_calls.is_empty()
            && self.usage.is_none()
    }
}

/// A `data:` frame of the chat stream: a chunk or an in-band error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatFrame {
    Error { error: bool, message: String },
    Chunk(ChatChunk),
}

impl ChatFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ChatFrame::Error {
            error: true,
            message: message.into(),
        }
    }
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_image_count")]
    pub number_of_images: u32,
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

fn default_image_count() -> u32 {
    1
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: default_aspect_ratio(),
            number_of_images: default_image_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodeAction {
    Refactor,
    Debug,
    Document,
    Explain,
    Test,
}

impl CodeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeAction::Refactor => "refactor",
            CodeAction::Debug => "debug",
            CodeAction::Document => "document",
            CodeAction::Explain => "explain",
            CodeAction::Test => "test",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSuggestionRequest {
    pub code: String,
    pub language: String,
    pub action: CodeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSuggestionResponse {
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAnalysisRequest {
    pub file_list: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceAnalysisResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlanRequest {
    pub goal: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,
}

/// `args` is normally a JSON object. A string holds argument text the planner
/// produced but that did not parse; it reaches the tool layer unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<PlannedToolCall>,
}

impl PlannedStep {
    pub fn into_task_step(self) -> TaskStep {
        let tool_call = self.tool_call.map(|call| match call.args {
            Value::Null => ToolCall::new(call.name, Value::Object(Default::default())),
            Value::String(raw) => ToolCall::with_raw_arguments(call.name, raw),
            args => ToolCall::new(call.name, args),
        });
        TaskStep::new(self.description, tool_call)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlanResponse {
    pub plan: Vec<PlannedStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetResponse {
    pub jsx: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePromptRequest {
    pub modification_prompt: String,
    pub image: InlineImage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePromptResponse {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyIntentRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptIntent {
    Chat,
    ImageGeneration,
}

impl PromptIntent {
    /// Any answer mentioning "image" counts as an image request.
    pub fn from_model_answer(answer: &str) -> Self {
        if answer.trim().to_lowercase().contains("image") {
            PromptIntent::ImageGeneration
        } else {
            PromptIntent::Chat
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyIntentResponse {
    pub intent: PromptIntent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_frame_distinguishes_error_from_chunk() {
        let error: ChatFrame =
            serde_json::from_value(json!({"error": true, "message": "quota"})).unwrap();
        assert_eq!(error, ChatFrame::error("quota"));

        let chunk: ChatFrame = serde_json::from_value(json!({"text": "Hel"})).unwrap();
        assert_eq!(chunk, ChatFrame::Chunk(ChatChunk::text("Hel")));
    }

    #[test]
    fn planned_step_becomes_pending_task_step() {
        let step: PlannedStep = serde_json::from_value(json!({
            "description": "Create the main HTML file",
            "toolCall": {"name": "createFile", "args": {"fileName": "index.html", "code": "<button>Click</button>"}}
        }))
        .unwrap();

        let task_step = step.into_task_step();
        let call = task_step.tool_call.expect("tool call");
        assert_eq!(call.function.name, "createFile");
        let args: Value = serde_json::from_str(&call.function.arguments).unwrap();
        assert_eq!(args["fileName"], "index.html");
        assert_eq!(task_step.status, mentor_core::StepStatus::Pending);
    }

    #[test]
    fn planned_step_without_args_gets_empty_object() {
        let step: PlannedStep = serde_json::from_value(json!({
            "description": "List files",
            "toolCall": {"name": "listFiles"}
        }))
        .unwrap();

        let call = step.into_task_step().tool_call.unwrap();
        assert_eq!(call.function.arguments, "{}");
    }

    #[test]
    fn intent_classification_is_lenient() {
        assert_eq!(
            PromptIntent::from_model_answer(" Image_Generation\n"),
            PromptIntent::ImageGeneration
        );
        assert_eq!(PromptIntent::from_model_answer("chat"), PromptIntent::Chat);
        assert_eq!(
            serde_json::to_value(PromptIntent::ImageGeneration).unwrap(),
            json!("image_generation")
        );
    }

    #[test]
    fn image_request_defaults() {
        let request: ImageRequest = serde_json::from_value(json!({"prompt": "a cat"})).unwrap();
        assert_eq!(request.aspect_ratio, "1:1");
        assert_eq!(request.number_of_images, 1);
    }
}
