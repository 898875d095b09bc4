use std::sync::Arc;

use mentor_core::{Session, SessionHandle, ToolError};
use mentor_llm::{LLMError, ModelGateway};
use tokio_util::sync::CancellationToken;

/// Everything a tool needs to apply one call to a session.
#[derive(Clone)]
pub struct ToolContext {
    pub session: SessionHandle,
    pub gateway: Arc<dyn ModelGateway>,
    pub cancel: CancellationToken,
    /// Set when the call belongs to a task step; mutations are dropped once
    /// that task is no longer the session's active task.
    pub task_id: Option<String>,
}

impl ToolContext {
    pub fn new(
        session: SessionHandle,
        gateway: Arc<dyn ModelGateway>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            gateway,
            cancel,
            task_id: None,
        }
    }

    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Applies `mutate` under the session write lock after re-checking the
    /// cancellation token and task identity.
    pub async fn apply<T, F>(&self, mutate: F) -> Result<T, ToolError>
    where
        F: FnOnce(&mut Session) -> Result<T, ToolError>,
    {
        let mut session = self.session.write().await;
        if self.cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        if let Some(task_id) = &self.task_id {
            let current = session.active_task.as_ref().map(|task| task.id.as_str());
            if current != Some(task_id.as_str()) {
                log::debug!(
                    "[{}] Dropping tool effect of superseded task {}",
                    session.id,
                    task_id
                );
                return Err(ToolError::Cancelled);
            }
        }
        let result = mutate(&mut *session)?;
        session.touch();
        Ok(result)
    }

    pub async fn read<T, F>(&self, inspect: F) -> T
    where
        F: FnOnce(&Session) -> T,
    {
        let session = self.session.read().await;
        inspect(&*session)
    }
}

/// Gateway failures end the step; cancellation keeps its own variant.
pub fn gateway_error(error: LLMError) -> ToolError {
    if error.is_cancelled() {
        ToolError::Cancelled
    } else {
        ToolError::Execution(error.user_message())
    }
}
