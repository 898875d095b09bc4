//! Direct workspace, widget and task commands issued outside the chat flow.

use mentor_core::{
    AiWidget, CodeFile, RunOutcome, SessionError, Task, ToolCall, ToolCatalog, WidgetError,
};
use mentor_llm::{CodeAction, CodeSuggestionRequest};
use mentor_tools::tools::{DEFAULT_TEST_FRAMEWORK, GENERATE_TEST_FILE};
use mentor_tools::{ToolContext, ToolExecutor, WorkspaceToolExecutor};
use serde_json::json;

use super::manager::{gateway_failure, tool_failure, ConversationManager, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceCodeAction {
    Refactor,
    Debug,
    Document,
    Explain,
    /// Writes `<base>.test.<ext>` next to the active file.
    Test { framework: Option<String> },
    Analyze,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeActionOutcome {
    FileUpdated(CodeFile),
    FileCreated(CodeFile),
    Report(String),
    Suggestions(Vec<String>),
}

impl ConversationManager {
    // ---- workspace ----

    /// Names are unique; adding an existing name fails.
    pub async fn add_file(&self, session_id: &str, name: &str, code: &str) -> Result<CodeFile> {
        self.with_session(session_id, |session| {
            Ok(session.workspace.create_file(name, code)?.clone())
        })
        .await
    }

    pub async fn update_file(&self, session_id: &str, file_id: &str, code: &str) -> Result<CodeFile> {
        self.with_session(session_id, |session| {
            Ok(session.workspace.update_file(file_id, code)?.clone())
        })
        .await
    }

    pub async fn rename_file(
        &self,
        session_id: &str,
        file_id: &str,
        new_name: &str,
    ) -> Result<CodeFile> {
        self.with_session(session_id, |session| {
            Ok(session.workspace.rename_file(file_id, new_name)?.clone())
        })
        .await
    }

    pub async fn delete_file(&self, session_id: &str, file_id: &str) -> Result<CodeFile> {
        self.with_session(session_id, |session| {
            Ok(session.workspace.delete_file(file_id)?)
        })
        .await
    }

    pub async fn set_active_file(&self, session_id: &str, file_id: Option<&str>) -> Result<()> {
        self.with_session(session_id, |session| {
            Ok(session.workspace.set_active(file_id)?)
        })
        .await
    }

    pub async fn append_output(&self, session_id: &str, text: &str) -> Result<()> {
        self.with_session(session_id, |session| {
            session.workspace.append_output(text);
            Ok(())
        })
        .await
    }

    pub async fn run_workspace(&self, session_id: &str) -> Result<RunOutcome> {
        self.with_session(session_id, |session| Ok(session.workspace.run()))
            .await
    }

    pub async fn reset_workspace(&self, session_id: &str) -> Result<()> {
        self.with_session(session_id, |session| {
            session.workspace.reset();
            Ok(())
        })
        .await
    }

    /// Runs an AI action on the active file. Refactor, debug and document
    /// replace its code; explain only reports.
    pub async fn perform_code_action(
        &self,
        session_id: &str,
        action: WorkspaceCodeAction,
    ) -> Result<CodeActionOutcome> {
        let handle = self.session(session_id)?;

        let code_action = match action {
            WorkspaceCodeAction::Analyze => {
                let suggestions = self
                    .workspace_suggestions(&handle, session_id)
                    .await
                    .map_err(gateway_failure)?
                    .unwrap_or_default();
                return Ok(CodeActionOutcome::Suggestions(suggestions));
            }
            WorkspaceCodeAction::Test { framework } => {
                return self.generate_tests(session_id, framework).await;
            }
            WorkspaceCodeAction::Refactor => CodeAction::Refactor,
            WorkspaceCodeAction::Debug => CodeAction::Debug,
            WorkspaceCodeAction::Document => CodeAction::Document,
            WorkspaceCodeAction::Explain => CodeAction::Explain,
        };

        let active = handle
            .read()
            .await
            .workspace
            .active_file()
            .cloned()
            .ok_or(SessionError::NoActiveFile)?;
        let request = CodeSuggestionRequest {
            code: active.code.clone(),
            language: active.language.clone(),
            action: code_action,
            framework: None,
        };
        let suggestion = self
            .generation(session_id, |token| async move {
                self.gateway.code_suggestion(&request, &token).await
            })
            .await
            .map_err(gateway_failure)?;

        if code_action == CodeAction::Explain {
            self.append_output(session_id, &format!("[explain] {}", active.name))
                .await?;
            return Ok(CodeActionOutcome::Report(suggestion));
        }

        let updated = self
            .with_session(session_id, |session| {
                let file = session.workspace.update_file(&active.id, &suggestion)?.clone();
                session
                    .workspace
                    .append_output(&format!("[{}] Updated '{}'", code_action.as_str(), file.name));
                Ok(file)
            })
            .await?;
        log::info!(
            "[{}] {} applied to {}",
            session_id,
            code_action.as_str(),
            updated.name
        );
        Ok(CodeActionOutcome::FileUpdated(updated))
    }

    async fn generate_tests(
        &self,
        session_id: &str,
        framework: Option<String>,
    ) -> Result<CodeActionOutcome> {
        let handle = self.session(session_id)?;
        let active = handle
            .read()
            .await
            .workspace
            .active_file()
            .cloned()
            .ok_or(SessionError::NoActiveFile)?;

        let call = ToolCall::new(
            GENERATE_TEST_FILE,
            json!({
                "fileName": active.name,
                "framework": framework.as_deref().unwrap_or(DEFAULT_TEST_FRAMEWORK),
            }),
        );
        let executor = WorkspaceToolExecutor::for_catalog(ToolCatalog::Workspace);
        let result = self
            .generation(session_id, |token| {
                let ctx = ToolContext::new(handle.clone(), self.gateway.clone(), token);
                async move { executor.execute(&call, &ctx).await }
            })
            .await
            .map_err(tool_failure)?;

        let file_id = result
            .result
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or_default();
        let created = handle.read().await.workspace.file(file_id).cloned();
        created
            .map(CodeActionOutcome::FileCreated)
            .ok_or(SessionError::Tool(result.summary))
    }

    // ---- widgets ----

    /// Generates markup for `prompt` and adds it as the active widget.
    pub async fn generate_widget(&self, session_id: &str, prompt: &str) -> Result<AiWidget> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        self.session(session_id)?;

        let markup = self
            .generation(session_id, |token| async move {
                self.gateway.generate_widget(prompt, &token).await
            })
            .await
            .map_err(gateway_failure)?;

        self.with_session(session_id, |session| {
            Ok(session.widgets.create(prompt, &markup).clone())
        })
        .await
    }

    pub async fn delete_widget(&self, session_id: &str, widget_id: &str) -> Result<AiWidget> {
        self.with_session(session_id, |session| {
            Ok(session.widgets.delete(widget_id)?)
        })
        .await
    }

    pub async fn set_active_widget(&self, session_id: &str, widget_id: Option<&str>) -> Result<()> {
        self.with_session(session_id, |session| {
            Ok(session.widgets.set_active(widget_id)?)
        })
        .await
    }

    pub async fn clear_widgets(&self, session_id: &str) -> Result<()> {
        self.with_session(session_id, |session| {
            session.widgets.clear();
            Ok(())
        })
        .await
    }

    /// Pins a widget owned by any session. Returns false if it was already pinned.
    pub async fn pin_widget(&self, widget_id: &str) -> Result<bool> {
        let mut exists = false;
        for handle in self.store.handles() {
            if handle.read().await.widgets.contains(widget_id) {
                exists = true;
                break;
            }
        }
        if !exists {
            return Err(WidgetError::NotFound(widget_id.to_string()).into());
        }
        Ok(self.pins.write().await.pin(widget_id))
    }

    pub async fn unpin_widget(&self, widget_id: &str) -> bool {
        self.pins.write().await.unpin(widget_id)
    }

    /// Pinned widgets that still exist, in pin order.
    pub async fn dashboard(&self) -> Vec<AiWidget> {
        let pins = self.pins.read().await.clone();
        pins.resolve_in_store(&self.store).await
    }

    // ---- tasks ----

    pub async fn run_task(&self, session_id: &str, goal: &str) -> Result<Task> {
        if goal.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let handle = self.session(session_id)?;
        self.orchestrator.run_task(&handle, goal, &self.events).await
    }

    /// `corrected` replaces the tool call of the failed step.
    pub async fn resume_task(&self, session_id: &str, corrected: Option<ToolCall>) -> Result<Task> {
        let handle = self.session(session_id)?;
        self.orchestrator
            .resume_task(&handle, corrected, &self.events)
            .await
    }

    pub async fn cancel_task(&self, session_id: &str) -> Result<Option<Task>> {
        let handle = self.session(session_id)?;
        self.orchestrator.cancel_task(&handle, &self.events).await
    }

    pub fn is_task_running(&self, session_id: &str) -> bool {
        self.orchestrator.is_running(session_id)
    }
}
