use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::persona::DEFAULT_PERSONA_ID;
use crate::task::Task;
use crate::tools::ToolCall;
use crate::widget::WidgetCollection;
use crate::workspace::WorkspaceState;

pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub tool_call_id: String,
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_responses: Option<Vec<ToolResponse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_cached: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    fn with_role(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            attachment: None,
            tool_calls: None,
            tool_responses: None,
            sources: None,
            suggested_actions: None,
            token_count: None,
            is_cached: false,
            is_error: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, text)
    }

    pub fn tool_result(responses: Vec<ToolResponse>, text: impl Into<String>) -> Self {
        let mut message = Self::with_role(Role::Tool, text);
        message.tool_responses = Some(responses);
        message
    }

    /// Assistant reply carrying a short, user-facing failure description.
    pub fn error(text: impl Into<String>) -> Self {
        let mut message = Self::with_role(Role::Assistant, text);
        message.is_error = true;
        message
    }

    pub fn cached(text: impl Into<String>) -> Self {
        let mut message = Self::with_role(Role::Assistant, text);
        message.is_cached = true;
        message
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub persona_id: String,
    #[serde(default)]
    pub workspace: WorkspaceState,
    #[serde(default)]
    pub widgets: WidgetCollection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_task: Option<Task>,
    #[serde(default)]
    pub task_history: Vec<Task>,
    #[serde(default)]
    pub model_params: ModelParams,
    #[serde(default)]
    pub web_access: bool,
    #[serde(default)]
    pub deep_analysis: bool,
    #[serde(default)]
    pub total_tokens: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            persona_id: DEFAULT_PERSONA_ID.to_string(),
            workspace: WorkspaceState::default(),
            widgets: WidgetCollection::default(),
            active_task: None,
            task_history: Vec::new(),
            model_params: ModelParams::default(),
            web_access: false,
            deep_analysis: false,
            total_tokens: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = persona_id.into();
        self
    }

    pub fn add_message(&mut self, message: Message) {
        if let Some(tokens) = message.token_count {
            self.total_tokens += u64::from(tokens);
        }
        self.messages.push(message);
        self.touch();
    }

    pub fn message_index(&self, message_id: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|message| message.id == message_id)
    }

    /// Keeps messages `0..=index` and drops the rest.
    pub fn truncate_after(&mut self, index: usize) {
        self.drop_from(index + 1);
        self.touch();
    }

    /// Removes messages from `start` on and takes their tokens off the total.
    fn drop_from(&mut self, start: usize) {
        if start >= self.messages.len() {
            return;
        }
        let dropped: u64 = self
            .messages
            .drain(start..)
            .filter_map(|message| message.token_count)
            .map(u64::from)
            .sum();
        self.total_tokens = self.total_tokens.saturating_sub(dropped);
    }

    /// Drops trailing assistant and tool messages back to the last user message.
    /// Returns the number of messages removed.
    pub fn drop_trailing_replies(&mut self) -> usize {
        let keep = self
            .messages
            .iter()
            .rposition(|message| message.role == Role::User)
            .map(|index| index + 1)
            .unwrap_or(0);
        let removed = self.messages.len() - keep;
        self.drop_from(keep);
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|message| message.id == message_id)
    }

    /// Moves the active task into history.
    pub fn archive_active_task(&mut self) -> Option<Task> {
        let task = self.active_task.take()?;
        self.task_history.push(task.clone());
        self.touch();
        Some(task)
    }

    /// Derives a title from the first user message while the default title is in place.
    pub fn title_from_first_message(&mut self) {
        if self.title != DEFAULT_SESSION_TITLE {
            return;
        }
        if let Some(first) = self.messages.iter().find(|m| m.role == Role::User) {
            let title: String = first.text.trim().chars().take(40).collect();
            if !title.is_empty() {
                self.title = title;
            }
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
