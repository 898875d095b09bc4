//! Goal -> plan -> sequential execution.
//!
//! ```text
//! planning ──> in-progress ──> completed
//!     │             │
//!     └──> failed <─┘      (failed tasks stay active and can be resumed)
//! ```
//!
//! Every state change is applied under the session write lock after checking
//! that the task's token is live and the task is still the session's active
//! task, so a superseded task can never touch the session again.

use std::sync::Arc;

use mentor_core::persona::persona_or_default;
use mentor_core::{
    Message, Session, SessionError, SessionEvent, SessionHandle, Task, TaskStatus, ToolCall,
    ToolCatalog, ToolError,
};
use mentor_llm::{ModelGateway, TaskPlanRequest};
use mentor_tools::{ToolContext, ToolExecutor, WorkspaceToolExecutor};
use tokio_util::sync::CancellationToken;

use crate::events::EventSink;
use crate::tokens::{Run, RunTokens};

pub type Result<T> = std::result::Result<T, SessionError>;

pub const CANCELLED_ERROR: &str = "cancelled";
const SUPERSEDED_ERROR: &str = "Superseded by a new task";

fn live_task<'a>(session: &'a mut Session, task_id: &str) -> Result<&'a mut Task> {
    session
        .active_task
        .as_mut()
        .filter(|task| task.id == task_id)
        .ok_or(SessionError::Cancelled)
}

/// Runs `update` under the write lock if `cancel` is still live.
async fn with_live_session<T>(
    session: &SessionHandle,
    cancel: &CancellationToken,
    update: impl FnOnce(&mut Session) -> Result<T>,
) -> Result<T> {
    let mut guard = session.write().await;
    if cancel.is_cancelled() {
        return Err(SessionError::Cancelled);
    }
    update(&mut *guard)
}

/// Tasks work on the workspace. Personas without a catalog of their own get
/// the file tools.
fn task_catalog(session: &Session) -> ToolCatalog {
    match persona_or_default(&session.persona_id).tool_catalog() {
        ToolCatalog::None => ToolCatalog::Workspace,
        catalog => catalog,
    }
}

pub struct TaskOrchestrator {
    gateway: Arc<dyn ModelGateway>,
    tokens: RunTokens,
}

impl TaskOrchestrator {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway,
            tokens: RunTokens::default(),
        }
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.tokens.is_running(session_id)
    }

    /// Starts a new task for `goal`, superseding any task already in the session.
    pub async fn run_task(
        &self,
        session: &SessionHandle,
        goal: &str,
        events: &EventSink,
    ) -> Result<Task> {
        let (session_id, task, token) = {
            let mut guard = session.write().await;
            let token = self.tokens.begin(&guard.id);
            if let Some(mut previous) = guard.active_task.take() {
                if !previous.is_finished() {
                    previous.fail(SUPERSEDED_ERROR);
                }
                guard.task_history.push(previous);
            }
            let task = Task::new(goal.trim());
            guard.active_task = Some(task.clone());
            guard.touch();
            (guard.id.clone(), task, token)
        };

        log::info!("[{}] Task {} started: {}", session_id, task.id, task.goal);
        events
            .send(SessionEvent::TaskUpdated { task: task.clone() })
            .await;

        let outcome = self.drive(session, &task.id, &token.token, events).await;
        self.finish(&session_id, &token, outcome)
    }

    /// Re-runs a failed task from its failed step. `corrected` replaces that
    /// step's tool call. Completed steps are never applied again.
    pub async fn resume_task(
        &self,
        session: &SessionHandle,
        corrected: Option<ToolCall>,
        events: &EventSink,
    ) -> Result<Task> {
        let (session_id, task, token) = {
            let mut guard = session.write().await;
            let Some(task) = guard
                .active_task
                .as_mut()
                .filter(|task| task.status == TaskStatus::Failed)
            else {
                return Err(SessionError::NoResumableTask);
            };

            if let Some(call) = corrected {
                match task.failed_step_index().or_else(|| task.next_step_index()) {
                    Some(index) => task.plan[index].tool_call = Some(call),
                    None => return Err(SessionError::NoResumableTask),
                }
            }
            task.error = None;
            task.status = if task.plan.is_empty() {
                TaskStatus::Planning
            } else {
                TaskStatus::InProgress
            };
            let task = task.clone();
            let token = self.tokens.begin(&guard.id);
            (guard.id.clone(), task, token)
        };

        log::info!("[{}] Task {} resumed", session_id, task.id);
        events
            .send(SessionEvent::TaskUpdated { task: task.clone() })
            .await;

        let outcome = self.drive(session, &task.id, &token.token, events).await;
        self.finish(&session_id, &token, outcome)
    }

    /// Abandons the active task: its token is cancelled, it is marked failed
    /// with error "cancelled" and moved to the task history.
    pub async fn cancel_task(
        &self,
        session: &SessionHandle,
        events: &EventSink,
    ) -> Result<Option<Task>> {
        let task = {
            let mut guard = session.write().await;
            self.tokens.cancel(&guard.id);
            match guard.active_task.as_mut() {
                Some(task) if task.status != TaskStatus::Completed => {
                    task.fail(CANCELLED_ERROR);
                    guard.archive_active_task()
                }
                _ => None,
            }
        };

        if let Some(task) = &task {
            events
                .send(SessionEvent::TaskUpdated { task: task.clone() })
                .await;
        }
        Ok(task)
    }

    fn finish(&self, session_id: &str, run: &Run, outcome: Result<Task>) -> Result<Task> {
        self.tokens.release(session_id, run);
        match &outcome {
            Ok(task) => log::info!(
                "[{}] Task {} ended as {:?}",
                session_id,
                task.id,
                task.status
            ),
            Err(SessionError::Cancelled) => {
                log::info!("[{}] Task abandoned after cancellation", session_id)
            }
            Err(error) => log::warn!("[{}] Task error: {}", session_id, error),
        }
        outcome
    }

    async fn drive(
        &self,
        session: &SessionHandle,
        task_id: &str,
        token: &CancellationToken,
        events: &EventSink,
    ) -> Result<Task> {
        let (needs_plan, catalog) = {
            let guard = session.read().await;
            let task = guard
                .active_task
                .as_ref()
                .filter(|task| task.id == task_id)
                .ok_or(SessionError::Cancelled)?;
            (task.plan.is_empty(), task_catalog(&guard))
        };
        let executor = WorkspaceToolExecutor::for_catalog(catalog);

        if needs_plan {
            if let Some(failed) = self.plan(session, task_id, token, &executor, events).await? {
                return Ok(failed);
            }
        }

        self.execute_steps(session, task_id, token, &executor, events)
            .await
    }

    /// Returns `Some(task)` when planning failed and the task has ended.
    async fn plan(
        &self,
        session: &SessionHandle,
        task_id: &str,
        token: &CancellationToken,
        executor: &WorkspaceToolExecutor,
        events: &EventSink,
    ) -> Result<Option<Task>> {
        let goal = {
            let guard = session.read().await;
            guard
                .active_task
                .as_ref()
                .map(|task| task.goal.clone())
                .unwrap_or_default()
        };
        let request = TaskPlanRequest {
            goal,
            tools: executor.list_tools(),
        };

        let planned = match self.gateway.task_plan(&request, token).await {
            Ok(steps) if steps.is_empty() => {
                Err("The model returned an empty plan.".to_string())
            }
            Ok(steps) => Ok(steps),
            Err(error) if error.is_cancelled() => return Err(SessionError::Cancelled),
            Err(error) => {
                log::warn!("Planning failed for task {}: {}", task_id, error);
                Err(format!("Planning failed: {}", error.user_message()))
            }
        };

        let (task, failed) = with_live_session(session, token, |guard| {
            let task = live_task(guard, task_id)?;
            match planned {
                Ok(steps) => {
                    task.begin_execution(steps.into_iter().map(|s| s.into_task_step()).collect());
                    Ok((task.clone(), false))
                }
                Err(reason) => {
                    task.fail(reason);
                    let snapshot = task.clone();
                    guard.add_message(Message::error(snapshot.summary()));
                    Ok((snapshot, true))
                }
            }
        })
        .await?;

        events
            .send(SessionEvent::TaskUpdated { task: task.clone() })
            .await;
        Ok(failed.then_some(task))
    }

    async fn execute_steps(
        &self,
        session: &SessionHandle,
        task_id: &str,
        token: &CancellationToken,
        executor: &WorkspaceToolExecutor,
        events: &EventSink,
    ) -> Result<Task> {
        loop {
            let started = with_live_session(session, token, |guard| {
                let task = live_task(guard, task_id)?;
                Ok(task.next_step_index().map(|index| {
                    task.start_step(index);
                    (index, task.plan[index].tool_call.clone(), task.clone())
                }))
            })
            .await?;

            let Some((index, tool_call, snapshot)) = started else {
                return self.complete(session, task_id, token, events).await;
            };
            events.send(SessionEvent::TaskUpdated { task: snapshot }).await;

            let Some(call) = tool_call else {
                // Narrative step.
                let task = with_live_session(session, token, |guard| {
                    let task = live_task(guard, task_id)?;
                    task.complete_step(index, None);
                    Ok(task.clone())
                })
                .await?;
                events.send(SessionEvent::TaskUpdated { task }).await;
                continue;
            };

            events
                .send(SessionEvent::ToolStart {
                    tool_call_id: call.id.clone(),
                    tool_name: call.function.name.clone(),
                    arguments: serde_json::from_str(&call.function.arguments)
                        .unwrap_or(serde_json::Value::Null),
                })
                .await;

            let ctx = ToolContext::new(session.clone(), self.gateway.clone(), token.clone())
                .for_task(task_id);
            match executor.execute(&call, &ctx).await {
                Ok(result) => {
                    let task = with_live_session(session, token, |guard| {
                        let task = live_task(guard, task_id)?;
                        task.complete_step(index, Some(result.clone()));
                        Ok(task.clone())
                    })
                    .await?;
                    events
                        .send(SessionEvent::ToolComplete {
                            tool_call_id: call.id.clone(),
                            result,
                        })
                        .await;
                    events.send(SessionEvent::TaskUpdated { task }).await;
                }
                Err(ToolError::Cancelled) => return Err(SessionError::Cancelled),
                Err(error) => {
                    let message = error.to_string();
                    let task = with_live_session(session, token, |guard| {
                        let task = live_task(guard, task_id)?;
                        task.fail_step(index, message.clone());
                        let snapshot = task.clone();
                        guard.add_message(Message::error(snapshot.summary()));
                        Ok(snapshot)
                    })
                    .await?;
                    events
                        .send(SessionEvent::ToolError {
                            tool_call_id: call.id.clone(),
                            error: message,
                        })
                        .await;
                    events
                        .send(SessionEvent::TaskUpdated { task: task.clone() })
                        .await;
                    return Ok(task);
                }
            }
        }
    }

    async fn complete(
        &self,
        session: &SessionHandle,
        task_id: &str,
        token: &CancellationToken,
        events: &EventSink,
    ) -> Result<Task> {
        let task = with_live_session(session, token, |guard| {
            let task = live_task(guard, task_id)?;
            task.complete();
            let summary = task.summary();
            guard.add_message(Message::assistant(summary));
            guard.archive_active_task().ok_or(SessionError::Cancelled)
        })
        .await?;

        events
            .send(SessionEvent::TaskUpdated { task: task.clone() })
            .await;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::{SessionStore, StepStatus};
    use mentor_llm::testing::ScriptedGateway;
    use mentor_llm::{PlannedStep, PlannedToolCall};
    use serde_json::json;

    fn step(description: &str, tool: Option<(&str, serde_json::Value)>) -> PlannedStep {
        PlannedStep {
            description: description.to_string(),
            tool_call: tool.map(|(name, args)| PlannedToolCall {
                name: name.to_string(),
                args,
            }),
        }
    }

    fn setup() -> (TaskOrchestrator, Arc<ScriptedGateway>, SessionHandle) {
        let gateway = Arc::new(ScriptedGateway::new());
        let orchestrator = TaskOrchestrator::new(gateway.clone());
        let session = SessionStore::new().create("sandbox");
        (orchestrator, gateway, session)
    }

    #[tokio::test]
    async fn html_button_goal_completes_with_one_file() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![step(
            "Create the main HTML file",
            Some((
                "createFile",
                json!({"fileName": "index.html", "code": "<button>Click me</button>"}),
            )),
        )]);

        let task = orchestrator
            .run_task(&session, "create an HTML file with a button", &EventSink::disabled())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        let guard = session.read().await;
        assert_eq!(guard.workspace.file_names(), vec!["index.html"]);
        assert!(guard.active_task.is_none());
        assert_eq!(guard.task_history.len(), 1);
        let last = guard.messages.last().unwrap();
        assert!(last.text.starts_with("Task completed: create an HTML file with a button"));
        assert!(!last.is_error);
    }

    #[tokio::test]
    async fn failure_at_step_k_halts_the_plan() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![
            step("one", Some(("createFile", json!({"fileName": "a.js", "code": "1"})))),
            step("two", Some(("updateFile", json!({"fileName": "missing.js", "code": "2"})))),
            step("three", Some(("createFile", json!({"fileName": "c.js", "code": "3"})))),
        ]);

        let task = orchestrator
            .run_task(&session, "three files", &EventSink::disabled())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("File 'missing.js' not found"));
        let statuses: Vec<StepStatus> = task.plan.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StepStatus::Completed, StepStatus::Failed, StepStatus::Pending]
        );
        let guard = session.read().await;
        assert_eq!(guard.workspace.file_names(), vec!["a.js"]);
        assert!(guard.active_task.is_some());
        assert!(guard.messages.last().unwrap().is_error);
    }

    #[tokio::test]
    async fn resume_with_corrected_call_skips_completed_steps() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![
            step("one", Some(("createFile", json!({"fileName": "a.js", "code": "1"})))),
            step("two", Some(("createFile", json!({"fileName": "b.js"})))),
            step("three", None),
        ]);
        let failed = orchestrator
            .run_task(&session, "two files", &EventSink::disabled())
            .await
            .unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert!(failed.error.unwrap().starts_with("Invalid arguments"));

        let corrected = ToolCall::new("createFile", json!({"fileName": "b.js", "code": "2"}));
        let task = orchestrator
            .resume_task(&session, Some(corrected), &EventSink::disabled())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.count_steps(StepStatus::Completed), 3);
        let guard = session.read().await;
        // a.js was created once; a second createFile would have failed.
        assert_eq!(guard.workspace.file_names(), vec!["a.js", "b.js"]);
        assert_eq!(guard.task_history.len(), 1);
    }

    #[tokio::test]
    async fn empty_plan_fails_in_planning() {
        let (orchestrator, _gateway, session) = setup();

        let task = orchestrator
            .run_task(&session, "do nothing", &EventSink::disabled())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.plan.is_empty());
        assert_eq!(
            task.error.as_deref(),
            Some("The model returned an empty plan.")
        );
    }

    #[tokio::test]
    async fn plan_error_is_reported_and_resumable() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan_error("Malformed JSON from model");
        gateway.push_plan(vec![step(
            "create",
            Some(("createFile", json!({"fileName": "x.md", "code": "# x"}))),
        )]);

        let failed = orchestrator
            .run_task(&session, "readme", &EventSink::disabled())
            .await
            .unwrap();
        assert!(failed.error.unwrap().starts_with("Planning failed"));

        let task = orchestrator
            .resume_task(&session, None, &EventSink::disabled())
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(gateway.call_count("task-plan"), 2);
    }

    #[tokio::test]
    async fn resume_without_failed_task_is_rejected() {
        let (orchestrator, _gateway, session) = setup();
        let error = orchestrator
            .resume_task(&session, None, &EventSink::disabled())
            .await
            .unwrap_err();
        assert!(matches!(error, SessionError::NoResumableTask));
    }

    #[tokio::test]
    async fn cancel_task_archives_failed_task() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![step("bad", Some(("nope", json!({}))))]);
        orchestrator
            .run_task(&session, "goal", &EventSink::disabled())
            .await
            .unwrap();

        let cancelled = orchestrator
            .cancel_task(&session, &EventSink::disabled())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cancelled.error.as_deref(), Some(CANCELLED_ERROR));
        let guard = session.read().await;
        assert!(guard.active_task.is_none());
        assert_eq!(guard.task_history.len(), 1);
    }

    #[tokio::test]
    async fn new_task_supersedes_the_previous_one() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![step("bad", Some(("nope", json!({}))))]);
        gateway.push_plan(vec![step("narrate", None)]);

        orchestrator
            .run_task(&session, "first", &EventSink::disabled())
            .await
            .unwrap();
        let second = orchestrator
            .run_task(&session, "second", &EventSink::disabled())
            .await
            .unwrap();

        assert_eq!(second.status, TaskStatus::Completed);
        let guard = session.read().await;
        let goals: Vec<&str> = guard.task_history.iter().map(|t| t.goal.as_str()).collect();
        assert_eq!(goals, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn late_result_of_a_superseded_task_is_dropped() {
        let (orchestrator, gateway, session) = setup();
        session.write().await.workspace.create_file("a.js", "1").unwrap();
        gateway.push_plan(vec![step(
            "tests",
            Some(("generateTestFile", json!({"fileName": "a.js"}))),
        )]);
        gateway.push_plan(vec![step("narrate", None)]);
        let hold = gateway.hold("code-suggestion");

        let first_sink = EventSink::disabled();
        let first = orchestrator.run_task(&session, "first", &first_sink);
        let second = async {
            hold.entered().await;
            let task = orchestrator
                .run_task(&session, "second", &EventSink::disabled())
                .await;
            hold.release();
            task
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(SessionError::Cancelled)));
        assert_eq!(second.unwrap().status, TaskStatus::Completed);
        let guard = session.read().await;
        assert_eq!(guard.workspace.file_names(), vec!["a.js"]);
        let first_task = guard.task_history.iter().find(|t| t.goal == "first").unwrap();
        assert_eq!(first_task.error.as_deref(), Some(SUPERSEDED_ERROR));
    }

    #[tokio::test]
    async fn malformed_arguments_fail_only_their_step_and_can_be_corrected() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![
            step("one", Some(("createFile", json!({"fileName": "a.js", "code": "1"})))),
            step("two", Some(("createFile", json!("{fileName: b.js")))),
        ]);

        let failed = orchestrator
            .run_task(&session, "two files", &EventSink::disabled())
            .await
            .unwrap();

        let statuses: Vec<StepStatus> = failed.plan.iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![StepStatus::Completed, StepStatus::Failed]);
        assert!(failed.error.unwrap().starts_with("Invalid arguments"));
        assert_eq!(session.read().await.workspace.file_names(), vec!["a.js"]);

        let corrected = ToolCall::new("createFile", json!({"fileName": "b.js", "code": "2"}));
        let task = orchestrator
            .resume_task(&session, Some(corrected), &EventSink::disabled())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(
            session.read().await.workspace.file_names(),
            vec!["a.js", "b.js"]
        );
    }

    #[tokio::test]
    async fn publishes_task_updates() {
        let (orchestrator, gateway, session) = setup();
        gateway.push_plan(vec![step("narrate", None)]);
        let (tx, mut rx) = tokio::sync::mpsc::channel(32);

        orchestrator
            .run_task(&session, "story", &EventSink::new(tx))
            .await
            .unwrap();

        let mut statuses = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::TaskUpdated { task } = event {
                statuses.push(task.status);
            }
        }
        assert_eq!(statuses.first(), Some(&TaskStatus::Planning));
        assert_eq!(statuses.last(), Some(&TaskStatus::Completed));
    }
}
