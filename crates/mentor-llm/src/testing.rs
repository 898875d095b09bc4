//! In-process [`ModelGateway`] with scripted replies, for tests of the
//! crates built on top of the gateway. Enabled by the `test-util` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::stream;
use futures_util::StreamExt;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::{LLMError, Result};
use crate::gateway::ModelGateway;
use crate::types::{
    ChatChunk, ChatRequest, ChatStream, CodeSuggestionRequest, ImagePromptRequest, ImageRequest,
    PlannedStep, PromptIntent, TaskPlanRequest,
};

/// One scripted chat reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Chunks(Vec<ChatChunk>),
    /// Emits the chunks, then an in-stream API error.
    FailAfter(Vec<ChatChunk>, String),
    /// Emits the chunks, then never finishes.
    Stall(Vec<ChatChunk>),
}

/// Parks the next call of one operation until released. The held call
/// ignores cancellation and returns its normal reply, like a response that
/// arrives after its caller moved on.
#[derive(Default)]
pub struct Hold {
    entered: Notify,
    released: Notify,
}

impl Hold {
    /// Waits until the held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<ScriptedReply>>,
    plans: Mutex<VecDeque<std::result::Result<Vec<PlannedStep>, String>>>,
    code: Mutex<Option<String>>,
    failures: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    holds: Mutex<HashMap<String, Arc<Hold>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: ScriptedReply) -> &Self {
        lock(&self.replies).push_back(reply);
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push_reply(ScriptedReply::Chunks(vec![ChatChunk::text(text)]))
    }

    pub fn push_plan(&self, plan: Vec<PlannedStep>) -> &Self {
        lock(&self.plans).push_back(Ok(plan));
        self
    }

    pub fn push_plan_error(&self, message: &str) -> &Self {
        lock(&self.plans).push_back(Err(message.to_string()));
        self
    }

    pub fn set_code(&self, code: &str) -> &Self {
        *lock(&self.code) = Some(code.to_string());
        self
    }

    /// Makes every later call of `operation` fail with an API error.
    pub fn fail(&self, operation: &str, message: &str) -> &Self {
        lock(&self.failures).insert(operation.to_string(), message.to_string());
        self
    }

    /// Holds the next call of `operation`.
    pub fn hold(&self, operation: &str) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        lock(&self.holds).insert(operation.to_string(), hold.clone());
        hold
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == operation).count()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        lock(&self.chat_requests).clone()
    }

    async fn enter(&self, operation: &str, cancel: &CancellationToken) -> Result<()> {
        lock(&self.calls).push(operation.to_string());
        let hold = lock(&self.holds).remove(operation);
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.released.notified().await;
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(LLMError::Cancelled);
        }
        match lock(&self.failures).get(operation) {
            Some(message) => Err(LLMError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

/// Markup produced for a widget prompt.
pub fn widget_markup(prompt: &str) -> String {
    format!("<div>{prompt}</div>")
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatStream> {
        self.enter("chat", cancel).await?;
        lock(&self.chat_requests).push(request.clone());

        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Chunks(vec![ChatChunk::text("OK")]));

        let stream: ChatStream = match reply {
            ScriptedReply::Chunks(chunks) => Box::pin(stream::iter(chunks.into_iter().map(Ok))),
            ScriptedReply::FailAfter(chunks, message) => Box::pin(
                stream::iter(chunks.into_iter().map(Ok))
                    .chain(stream::once(async move { Err(LLMError::Api(message)) })),
            ),
            ScriptedReply::Stall(chunks) => Box::pin(
                stream::iter(chunks.into_iter().map(Ok)).chain(stream::pending()),
            ),
        };
        Ok(stream)
    }

    async fn generate_images(
        &self,
        request: &ImageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        self.enter("image", cancel).await?;
        Ok((0..request.number_of_images.max(1))
            .map(|_| "data:image/jpeg;base64,AAAA".to_string())
            .collect())
    }

    async fn code_suggestion(
        &self,
        request: &CodeSuggestionRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.enter("code-suggestion", cancel).await?;
        Ok(lock(&self.code)
            .clone()
            .unwrap_or_else(|| format!("// {}\n{}", request.action.as_str(), request.code)))
    }

    async fn workspace_analysis(
        &self,
        file_list: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        self.enter("workspace-analysis", cancel).await?;
        Ok(vec![
            format!("Add tests for {} files", file_list.len()),
            "Add a README".to_string(),
            "Set up linting".to_string(),
        ])
    }

    async fn task_plan(
        &self,
        _request: &TaskPlanRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlannedStep>> {
        self.enter("task-plan", cancel).await?;
        match lock(&self.plans).pop_front() {
            Some(Ok(plan)) => Ok(plan),
            Some(Err(message)) => Err(LLMError::InvalidResponse(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn generate_widget(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        self.enter("widget", cancel).await?;
        Ok(widget_markup(prompt))
    }

    async fn image_prompt(
        &self,
        request: &ImagePromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.enter("image-prompt", cancel).await?;
        Ok(format!("A photo with {}", request.modification_prompt))
    }

    async fn classify_intent(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<PromptIntent> {
        self.enter("classify-intent", cancel).await?;
        Ok(PromptIntent::from_model_answer(prompt))
    }
}
