use std::future::Future;
use std::sync::Arc;

use mentor_core::cache::{cached_reply, estimate_tokens};
use mentor_core::persona::{find_persona, persona_or_default};
use mentor_core::session::{SessionSummary, DEFAULT_SESSION_TITLE};
use mentor_core::{
    Attachment, ClientConfig, DashboardPins, EfficiencyStats, Message, ModelParams, Persona,
    Role, RunOutcome, Session, SessionError, SessionEvent, SessionHandle, SessionStore, ToolCall,
    ToolCatalog, ToolError, ToolResponse,
};
use mentor_llm::{
    ChatRequest, ImagePromptRequest, ImageRequest, InlineImage, LLMError, ModelGateway,
    PromptIntent,
};
use mentor_tools::tools::{CREATE_WIDGET, UPDATE_WIDGET};
use mentor_tools::{ToolContext, ToolExecutor, WorkspaceToolExecutor};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::export::export_markdown;
use super::intent::{classify_input, mentions_images, Intent, SlashCommand};
use crate::config::LoopConfig;
use crate::events::EventSink;
use crate::orchestrator::TaskOrchestrator;
use crate::stream::consume_chat_stream;
use crate::tokens::RunTokens;

pub type Result<T> = std::result::Result<T, SessionError>;

const EMPTY_WORKSPACE_NOTICE: &str =
    "The workspace is empty. Add a file before asking for an analysis.";

pub(super) fn gateway_failure(error: LLMError) -> SessionError {
    if error.is_cancelled() {
        SessionError::Cancelled
    } else {
        SessionError::Gateway(error.user_message())
    }
}

pub(super) fn tool_failure(error: ToolError) -> SessionError {
    match error {
        ToolError::Cancelled => SessionError::Cancelled,
        other => SessionError::Tool(other.to_string()),
    }
}

fn tool_arguments(call: &ToolCall) -> Value {
    serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null)
}

fn token_count(text: &str) -> u32 {
    u32::try_from(estimate_tokens(text)).unwrap_or(u32::MAX)
}

/// Splits a `data:` URL into an attachment.
fn image_attachment(url: &str) -> Attachment {
    let (mime_type, data) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .unwrap_or(("image/jpeg", url));
    let extension = mime_type.rsplit('/').next().unwrap_or("jpeg");
    Attachment {
        name: format!("generated.{extension}"),
        mime_type: mime_type.to_string(),
        data: data.to_string(),
        size: data.len() as u64 * 3 / 4,
    }
}

fn suggestions_message(suggestions: Vec<String>) -> Message {
    let mut text = String::from("Here are some ideas for your workspace:");
    for suggestion in &suggestions {
        text.push_str("\n- ");
        text.push_str(suggestion);
    }
    let mut message = Message::assistant(text);
    message.suggested_actions = Some(suggestions);
    message
}

/// Owns the sessions and turns user input into replies.
///
/// Locks are only held for short, synchronous mutations; every model call
/// happens outside the session lock and carries the session's generation
/// token, so [`ConversationManager::stop_generation`] or a newer request
/// cancels it.
pub struct ConversationManager {
    pub(super) store: Arc<SessionStore>,
    pub(super) gateway: Arc<dyn ModelGateway>,
    pub(super) orchestrator: TaskOrchestrator,
    pub(super) config: RwLock<ClientConfig>,
    pub(super) loop_config: LoopConfig,
    pub(super) pins: RwLock<DashboardPins>,
    pub(super) stats: RwLock<EfficiencyStats>,
    pub(super) generations: RunTokens,
    pub(super) events: EventSink,
}

impl ConversationManager {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: ClientConfig) -> Self {
        let loop_config = LoopConfig::from(&config);
        Self {
            store: Arc::new(SessionStore::new()),
            orchestrator: TaskOrchestrator::new(gateway.clone()),
            gateway,
            config: RwLock::new(config),
            loop_config,
            pins: RwLock::new(DashboardPins::new()),
            stats: RwLock::new(EfficiencyStats::default()),
            generations: RunTokens::default(),
            events: EventSink::disabled(),
        }
    }

    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn config(&self) -> ClientConfig {
        self.config.read().await.clone()
    }

    pub async fn efficiency_stats(&self) -> EfficiencyStats {
        *self.stats.read().await
    }

    pub fn session(&self, session_id: &str) -> Result<SessionHandle> {
        self.store
            .get(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    /// A copy of the session as it is right now.
    pub async fn snapshot(&self, session_id: &str) -> Result<Session> {
        Ok(self.session(session_id)?.read().await.clone())
    }

    pub(super) async fn with_session<T>(
        &self,
        session_id: &str,
        update: impl FnOnce(&mut Session) -> Result<T>,
    ) -> Result<T> {
        let handle = self.session(session_id)?;
        let mut session = handle.write().await;
        let result = update(&mut *session)?;
        session.touch();
        Ok(result)
    }

    /// Runs `call` with a fresh generation token for the session.
    pub(super) async fn generation<T, F, Fut>(&self, session_id: &str, call: F) -> T
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T>,
    {
        let run = self.generations.begin(session_id);
        let result = call(run.token.clone()).await;
        self.generations.release(session_id, &run);
        result
    }

    // ---- sessions ----

    /// Starts an empty chat. Without a persona the configured default is used.
    pub async fn new_chat(&self, persona_id: Option<&str>) -> Result<String> {
        let persona = match persona_id {
            Some(id) => find_persona(id).ok_or_else(|| SessionError::UnknownPersona(id.to_string()))?,
            None => persona_or_default(&self.config.read().await.default_persona),
        };
        let handle = self.store.create(&persona.id);
        let id = handle.read().await.id.clone();
        log::info!("[{}] New chat with persona {}", id, persona.id);
        Ok(id)
    }

    /// Stops anything running in the session and forgets it.
    pub async fn delete_chat(&self, session_id: &str) -> Result<()> {
        let handle = self.session(session_id)?;
        self.generations.cancel(session_id);
        self.orchestrator.cancel_task(&handle, &self.events).await?;
        self.store.remove(session_id);
        log::info!("[{}] Chat deleted", session_id);
        Ok(())
    }

    pub async fn list_chats(&self) -> Vec<SessionSummary> {
        self.store.summaries().await
    }

    pub async fn rename_chat(&self, session_id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        self.with_session(session_id, |session| {
            session.title = if title.is_empty() {
                DEFAULT_SESSION_TITLE.to_string()
            } else {
                title.to_string()
            };
            Ok(())
        })
        .await
    }

    pub async fn set_persona(&self, session_id: &str, persona_id: &str) -> Result<Persona> {
        let persona = find_persona(persona_id)
            .ok_or_else(|| SessionError::UnknownPersona(persona_id.to_string()))?;
        self.with_session(session_id, |session| {
            session.persona_id = persona.id.clone();
            Ok(())
        })
        .await?;
        Ok(persona)
    }

    pub async fn set_model_params(&self, session_id: &str, params: ModelParams) -> Result<()> {
        self.with_session(session_id, |session| {
            session.model_params = params;
            Ok(())
        })
        .await
    }

    /// Returns the new value.
    pub async fn toggle_web_access(&self, session_id: &str) -> Result<bool> {
        self.with_session(session_id, |session| {
            session.web_access = !session.web_access;
            Ok(session.web_access)
        })
        .await
    }

    /// Returns the new value.
    pub async fn toggle_deep_analysis(&self, session_id: &str) -> Result<bool> {
        self.with_session(session_id, |session| {
            session.deep_analysis = !session.deep_analysis;
            Ok(session.deep_analysis)
        })
        .await
    }

    pub async fn set_cost_saver(&self, enabled: bool) {
        self.config.write().await.cost_saver = enabled;
    }

    pub async fn set_custom_instruction(&self, instruction: &str) {
        self.config.write().await.custom_instruction = instruction.trim().to_string();
    }

    pub async fn export_chat(&self, session_id: &str) -> Result<String> {
        let handle = self.session(session_id)?;
        let session = handle.read().await;
        Ok(export_markdown(&session))
    }

    // ---- messaging ----

    /// Appends a user message and produces the reply.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message> {
        let handle = self.session(session_id)?;
        if text.trim().is_empty() && attachment.is_none() {
            return Err(SessionError::EmptyMessage);
        }

        {
            let mut session = handle.write().await;
            let mut message = Message::user(text.trim());
            if let Some(attachment) = attachment {
                message = message.with_attachment(attachment);
            }
            session.add_message(message);
            session.title_from_first_message();
        }

        self.respond(&handle).await
    }

    /// Replaces the text of a user message, drops everything after it and
    /// answers again.
    pub async fn edit_message(
        &self,
        session_id: &str,
        message_id: &str,
        text: &str,
    ) -> Result<Message> {
        let handle = self.session(session_id)?;
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        {
            let mut session = handle.write().await;
            let index = session
                .message_index(message_id)
                .ok_or_else(|| SessionError::MessageNotFound(message_id.to_string()))?;
            if session.messages[index].role != Role::User {
                return Err(SessionError::NotEditable);
            }
            session.truncate_after(index);
            session.messages[index].text = text.trim().to_string();
        }
        log::debug!("[{}] Edited message {}", session_id, message_id);

        self.respond(&handle).await
    }

    /// Drops the replies after the last user message and answers it again.
    pub async fn regenerate(&self, session_id: &str) -> Result<Message> {
        let handle = self.session(session_id)?;
        {
            let mut session = handle.write().await;
            if session.last_user_message().is_none() {
                return Err(SessionError::MessageNotFound("user message".to_string()));
            }
            session.drop_trailing_replies();
        }
        self.respond(&handle).await
    }

    /// Cancels the in-flight model call. Returns false when nothing was running.
    pub fn stop_generation(&self, session_id: &str) -> bool {
        let stopped = self.generations.cancel(session_id);
        if stopped {
            log::info!("[{}] Generation stopped", session_id);
        }
        stopped
    }

    pub fn is_generating(&self, session_id: &str) -> bool {
        self.generations.is_running(session_id)
    }

    async fn respond(&self, handle: &SessionHandle) -> Result<Message> {
        let (session_id, input, attachment, persona, active_widget) = {
            let session = handle.read().await;
            let last = session
                .last_user_message()
                .ok_or_else(|| SessionError::MessageNotFound("user message".to_string()))?;
            (
                session.id.clone(),
                last.text.clone(),
                last.attachment.clone(),
                persona_or_default(&session.persona_id),
                session.widgets.active().cloned(),
            )
        };

        let intent = classify_input(&input, &persona, active_widget.as_ref());
        log::debug!("[{}] Routing input as {:?}", session_id, intent);

        match intent {
            Intent::Chat => {
                if attachment.is_none() {
                    if let Some(reply) = cached_reply(&input) {
                        return self.reply_from_cache(handle, &input, reply).await;
                    }
                }
                if !persona.is_widget_factory()
                    && mentions_images(&input)
                    && self.wants_image(&session_id, &input).await?
                {
                    return self
                        .reply_with_image(handle, &session_id, &input, attachment)
                        .await;
                }
                self.stream_reply(handle, &session_id, &persona).await
            }
            Intent::Image { prompt } => {
                self.reply_with_image(handle, &session_id, &prompt, attachment)
                    .await
            }
            Intent::CreateWidget { prompt } => {
                let call = ToolCall::new(CREATE_WIDGET, json!({ "prompt": prompt }));
                self.reply_with_widget_call(handle, &session_id, call).await
            }
            Intent::UpdateWidget {
                widget_id,
                new_prompt,
            } => {
                let call = ToolCall::new(
                    UPDATE_WIDGET,
                    json!({ "widgetId": widget_id, "newPrompt": new_prompt }),
                );
                self.reply_with_widget_call(handle, &session_id, call).await
            }
            Intent::ExecuteTask { goal } => {
                let task = self
                    .orchestrator
                    .run_task(handle, &goal, &self.events)
                    .await?;
                let session = handle.read().await;
                session
                    .messages
                    .last()
                    .filter(|message| message.role == Role::Assistant)
                    .cloned()
                    .ok_or(SessionError::MessageNotFound(task.id))
            }
            Intent::Command(command) => self.run_command(handle, &session_id, command).await,
        }
    }

    /// Appends `message` unless `token` was cancelled meanwhile.
    async fn publish(
        &self,
        handle: &SessionHandle,
        token: &CancellationToken,
        message: Message,
    ) -> Result<Message> {
        {
            let mut session = handle.write().await;
            if token.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            session.add_message(message.clone());
        }

        let event = if message.is_error {
            SessionEvent::Error {
                message: message.text.clone(),
            }
        } else {
            SessionEvent::Complete {
                message_id: message.id.clone(),
            }
        };
        self.events.send(event).await;
        Ok(message)
    }

    /// Gateway failures become an error reply; the conversation stays usable.
    async fn publish_failure(
        &self,
        handle: &SessionHandle,
        token: &CancellationToken,
        error: LLMError,
    ) -> Result<Message> {
        if error.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        log::warn!("Model call failed: {}", error);
        self.publish(handle, token, Message::error(error.user_message()))
            .await
    }

    async fn reply_from_cache(
        &self,
        handle: &SessionHandle,
        input: &str,
        reply: &str,
    ) -> Result<Message> {
        let cost_saver = self.config.read().await.cost_saver;
        self.stats
            .write()
            .await
            .record_cache_hit(input, reply, cost_saver);
        log::debug!("Answered '{}' from the local cache", input);
        self.publish(handle, &CancellationToken::new(), Message::cached(reply))
            .await
    }

    async fn wants_image(&self, session_id: &str, input: &str) -> Result<bool> {
        let intent = self
            .generation(session_id, |token| async move {
                self.gateway.classify_intent(input, &token).await
            })
            .await;
        match intent {
            Ok(intent) => Ok(intent == PromptIntent::ImageGeneration),
            Err(error) if error.is_cancelled() => Err(SessionError::Cancelled),
            Err(error) => {
                log::warn!("[{}] Intent classification failed: {}", session_id, error);
                Ok(false)
            }
        }
    }

    async fn reply_with_image(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        prompt: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message> {
        let run = self.generations.begin(session_id);
        let generated = self.generate_image(prompt, attachment, &run.token).await;
        self.generations.release(session_id, &run);

        match generated {
            Ok((prompt, images)) => match images.first() {
                Some(url) => {
                    let message = Message::assistant(format!("Here is your image for \"{prompt}\"."))
                        .with_attachment(image_attachment(url));
                    self.publish(handle, &run.token, message).await
                }
                None => {
                    let error = LLMError::InvalidResponse("no images returned".to_string());
                    self.publish_failure(handle, &run.token, error).await
                }
            },
            Err(error) => self.publish_failure(handle, &run.token, error).await,
        }
    }

    /// An attached image is first turned into a new prompt describing the
    /// requested modification.
    async fn generate_image(
        &self,
        prompt: &str,
        attachment: Option<Attachment>,
        token: &CancellationToken,
    ) -> std::result::Result<(String, Vec<String>), LLMError> {
        let prompt = match attachment.filter(|a| a.mime_type.starts_with("image/")) {
            Some(image) => {
                let request = ImagePromptRequest {
                    modification_prompt: prompt.to_string(),
                    image: InlineImage {
                        mime_type: image.mime_type,
                        data: image.data,
                    },
                };
                self.gateway.image_prompt(&request, token).await?
            }
            None => prompt.to_string(),
        };
        let images = self
            .gateway
            .generate_images(&ImageRequest::new(prompt.clone()), token)
            .await?;
        Ok((prompt, images))
    }

    async fn reply_with_widget_call(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        call: ToolCall,
    ) -> Result<Message> {
        let executor = WorkspaceToolExecutor::for_catalog(ToolCatalog::Widgets);
        let run = self.generations.begin(session_id);
        let ctx = ToolContext::new(handle.clone(), self.gateway.clone(), run.token.clone());

        self.events
            .send(SessionEvent::ToolStart {
                tool_call_id: call.id.clone(),
                tool_name: call.name().to_string(),
                arguments: tool_arguments(&call),
            })
            .await;
        let outcome = executor.execute(&call, &ctx).await;
        self.generations.release(session_id, &run);

        match outcome {
            Ok(result) => {
                self.events
                    .send(SessionEvent::ToolComplete {
                        tool_call_id: call.id.clone(),
                        result: result.clone(),
                    })
                    .await;
                let mut message = Message::assistant(result.summary);
                message.tool_responses = Some(vec![ToolResponse {
                    tool_call_id: call.id.clone(),
                    name: call.name().to_string(),
                    response: result.result,
                }]);
                message.tool_calls = Some(vec![call]);
                self.publish(handle, &run.token, message).await
            }
            Err(ToolError::Cancelled) => Err(SessionError::Cancelled),
            Err(error) => {
                self.events
                    .send(SessionEvent::ToolError {
                        tool_call_id: call.id.clone(),
                        error: error.to_string(),
                    })
                    .await;
                self.publish(handle, &run.token, Message::error(error.to_string()))
                    .await
            }
        }
    }

    async fn stream_reply(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        persona: &Persona,
    ) -> Result<Message> {
        let run = self.generations.begin(session_id);
        let result = self.stream_reply_with(handle, persona, &run.token).await;
        self.generations.release(session_id, &run);
        result
    }

    async fn stream_reply_with(
        &self,
        handle: &SessionHandle,
        persona: &Persona,
        token: &CancellationToken,
    ) -> Result<Message> {
        let executor = WorkspaceToolExecutor::for_catalog(persona.tool_catalog());
        let config = self.config().await;

        let (request, placeholder_id) = {
            let mut session = handle.write().await;
            let request = ChatRequest {
                history: session.messages.clone(),
                persona: persona.clone(),
                is_web_access_enabled: session.web_access,
                is_cost_saver_mode: config.cost_saver,
                is_deep_analysis: session.deep_analysis,
                custom_instruction: config.custom_instruction,
                model_params: session.model_params,
                tools: executor.list_tools(),
            };
            let placeholder = Message::assistant("");
            let id = placeholder.id.clone();
            session.add_message(placeholder);
            (request, id)
        };

        let stream = match self.gateway.chat_stream(&request, token).await {
            Ok(stream) => stream,
            Err(error) => return self.fail_reply(handle, &placeholder_id, token, error).await,
        };
        let output = match consume_chat_stream(
            stream,
            handle,
            &placeholder_id,
            &self.events,
            token,
            self.loop_config.stream_idle_timeout,
        )
        .await
        {
            Ok(output) => output,
            Err(error) => return self.fail_reply(handle, &placeholder_id, token, error).await,
        };
        if output.stopped {
            return self.finish_stopped(handle, &placeholder_id).await;
        }

        let mut responses = Vec::with_capacity(output.tool_calls.len());
        let mut summaries = Vec::new();
        if !output.tool_calls.is_empty() {
            let ctx = ToolContext::new(handle.clone(), self.gateway.clone(), token.clone());
            for call in &output.tool_calls {
                self.events
                    .send(SessionEvent::ToolStart {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name().to_string(),
                        arguments: tool_arguments(call),
                    })
                    .await;
                let response = match executor.execute(call, &ctx).await {
                    Ok(result) => {
                        summaries.push(result.summary.clone());
                        let response = json!({
                            "success": true,
                            "result": result.result,
                            "summary": result.summary,
                        });
                        self.events
                            .send(SessionEvent::ToolComplete {
                                tool_call_id: call.id.clone(),
                                result,
                            })
                            .await;
                        response
                    }
                    Err(ToolError::Cancelled) => {
                        return self.finish_stopped(handle, &placeholder_id).await
                    }
                    Err(error) => {
                        self.events
                            .send(SessionEvent::ToolError {
                                tool_call_id: call.id.clone(),
                                error: error.to_string(),
                            })
                            .await;
                        json!({ "error": error.to_string() })
                    }
                };
                responses.push(ToolResponse {
                    tool_call_id: call.id.clone(),
                    name: call.name().to_string(),
                    response,
                });
            }
        }

        let message = {
            let mut session = handle.write().await;
            if token.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            let index = session
                .message_index(&placeholder_id)
                .ok_or(SessionError::Cancelled)?;
            let message = &mut session.messages[index];
            if message.text.is_empty() && !summaries.is_empty() {
                message.text = summaries.join("\n");
            }
            if !output.tool_calls.is_empty() {
                message.tool_calls = Some(output.tool_calls);
                message.tool_responses = Some(responses);
            }
            if !output.sources.is_empty() {
                message.sources = Some(output.sources);
            }
            let tokens = output
                .usage
                .map(|usage| usage.total_tokens)
                .unwrap_or_else(|| token_count(&message.text));
            message.token_count = Some(tokens);
            let message = message.clone();
            session.total_tokens += u64::from(tokens);
            session.touch();
            message
        };

        self.events
            .send(SessionEvent::Complete {
                message_id: message.id.clone(),
            })
            .await;
        Ok(message)
    }

    async fn fail_reply(
        &self,
        handle: &SessionHandle,
        placeholder_id: &str,
        token: &CancellationToken,
        error: LLMError,
    ) -> Result<Message> {
        if error.is_cancelled() || token.is_cancelled() {
            return self.finish_stopped(handle, placeholder_id).await;
        }
        log::warn!("Chat reply failed: {}", error);

        let message = Message::error(error.user_message());
        {
            let mut session = handle.write().await;
            if let Some(index) = session.message_index(placeholder_id) {
                if session.messages[index].text.is_empty() {
                    session.messages.remove(index);
                }
            }
            session.add_message(message.clone());
        }
        self.events
            .send(SessionEvent::Error {
                message: message.text.clone(),
            })
            .await;
        Ok(message)
    }

    /// Keeps whatever text arrived before the stop. An empty reply is removed.
    async fn finish_stopped(&self, handle: &SessionHandle, placeholder_id: &str) -> Result<Message> {
        let mut session = handle.write().await;
        let index = session
            .message_index(placeholder_id)
            .ok_or(SessionError::Cancelled)?;
        if session.messages[index].text.is_empty() {
            session.messages.remove(index);
            session.touch();
            return Err(SessionError::Cancelled);
        }

        let tokens = token_count(&session.messages[index].text);
        session.messages[index].token_count = Some(tokens);
        session.total_tokens += u64::from(tokens);
        session.touch();
        Ok(session.messages[index].clone())
    }

    async fn run_command(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        command: SlashCommand,
    ) -> Result<Message> {
        let message = match command {
            SlashCommand::Analyze => match self.workspace_suggestions(handle, session_id).await {
                Ok(Some(suggestions)) => suggestions_message(suggestions),
                Ok(None) => Message::assistant(EMPTY_WORKSPACE_NOTICE),
                Err(error) if error.is_cancelled() => return Err(SessionError::Cancelled),
                Err(error) => Message::error(error.user_message()),
            },
            SlashCommand::Run => {
                let outcome = handle.write().await.workspace.run();
                match outcome {
                    RunOutcome::Preview { entry } => {
                        Message::assistant(format!("Built a preview from '{entry}'."))
                    }
                    RunOutcome::NotPreviewable => Message::assistant(
                        "Only web projects can be previewed. Add an HTML file to build a preview.",
                    ),
                }
            }
            SlashCommand::Clear => {
                handle.write().await.widgets.clear();
                Message::assistant("Cleared all widgets.")
            }
            SlashCommand::Usage(usage) => Message::error(usage),
            SlashCommand::Unknown(name) => Message::error(format!("Unknown command: {name}")),
        };
        self.publish(handle, &CancellationToken::new(), message)
            .await
    }

    /// `None` when the workspace has no files to analyze.
    pub(super) async fn workspace_suggestions(
        &self,
        handle: &SessionHandle,
        session_id: &str,
    ) -> std::result::Result<Option<Vec<String>>, LLMError> {
        let files = handle.read().await.workspace.file_names();
        if files.is_empty() {
            return Ok(None);
        }
        self.generation(session_id, |token| async move {
            self.gateway.workspace_analysis(&files, &token).await
        })
        .await
        .map(Some)
    }
}
