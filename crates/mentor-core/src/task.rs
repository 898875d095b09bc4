//! Task and step model for goal-driven tool execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::{ToolCall, ToolResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Planning,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStep {
    pub id: String,
    pub description: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<ToolResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStep {
    pub fn new(description: impl Into<String>, tool_call: Option<ToolCall>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            status: StepStatus::Pending,
            tool_call,
            tool_response: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub goal: String,
    pub plan: Vec<TaskStep>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(goal: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            goal: goal.into(),
            plan: Vec::new(),
            status: TaskStatus::Planning,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Installs the plan and moves the task to execution.
    pub fn begin_execution(&mut self, plan: Vec<TaskStep>) {
        self.plan = plan;
        self.status = TaskStatus::InProgress;
        self.error = None;
        self.touch();
    }

    /// First step that has not completed. Steps run strictly in order, so this
    /// is also where a resumed task picks up.
    pub fn next_step_index(&self) -> Option<usize> {
        self.plan
            .iter()
            .position(|step| step.status != StepStatus::Completed)
    }

    pub fn start_step(&mut self, index: usize) {
        if let Some(step) = self.plan.get_mut(index) {
            step.status = StepStatus::InProgress;
            step.error = None;
        }
        self.status = TaskStatus::InProgress;
        self.error = None;
        self.touch();
    }

    pub fn complete_step(&mut self, index: usize, result: Option<ToolResult>) {
        if let Some(step) = self.plan.get_mut(index) {
            step.status = StepStatus::Completed;
            step.tool_response = result;
        }
        self.touch();
    }

    /// Marks the step failed and carries its error up to the task.
    pub fn fail_step(&mut self, index: usize, error: impl Into<String>) {
        let error = error.into();
        if let Some(step) = self.plan.get_mut(index) {
            step.status = StepStatus::Failed;
            step.error = Some(error.clone());
        }
        self.fail(error);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.touch();
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.error = None;
        self.touch();
    }

    pub fn failed_step_index(&self) -> Option<usize> {
        self.plan
            .iter()
            .position(|step| step.status == StepStatus::Failed)
    }

    pub fn count_steps(&self, status: StepStatus) -> usize {
        self.plan.iter().filter(|step| step.status == status).count()
    }

    /// Checklist rendering used in conversation summaries.
    pub fn format_checklist(&self) -> String {
        let mut output = String::new();
        for step in &self.plan {
            let status_icon = match step.status {
                StepStatus::Pending => "[ ]",
                StepStatus::InProgress => "[/]",
                StepStatus::Completed => "[x]",
                StepStatus::Failed => "[!]",
            };
            output.push_str(&format!("\n{} {}", status_icon, step.description));
            if let Some(error) = &step.error {
                output.push_str(&format!("\n    Error: {}", error));
            }
        }

        output.push_str(&format!(
            "\n\nProgress: {}/{} steps completed",
            self.count_steps(StepStatus::Completed),
            self.plan.len()
        ));
        output
    }

    pub fn summary(&self) -> String {
        match self.status {
            TaskStatus::Completed => format!(
                "Task completed: {}\n{}",
                self.goal,
                self.format_checklist()
            ),
            TaskStatus::Failed => format!(
                "Task failed: {}\nReason: {}\n{}",
                self.goal,
                self.error.as_deref().unwrap_or("unknown error"),
                self.format_checklist()
            ),
            TaskStatus::Planning | TaskStatus::InProgress => {
                format!("Working on: {}\n{}", self.goal, self.format_checklist())
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three_step_task() -> Task {
        let mut task = Task::new("build a page");
        task.begin_execution(vec![
            TaskStep::new("one", None),
            TaskStep::new("two", None),
            TaskStep::new("three", None),
        ]);
        task
    }

    #[test]
    fn new_task_starts_in_planning() {
        let task = Task::new("goal");
        assert_eq!(task.status, TaskStatus::Planning);
        assert!(task.plan.is_empty());
        assert!(!task.is_finished());
    }

    #[test]
    fn failing_a_step_fails_the_task_and_leaves_later_steps_pending() {
        let mut task = three_step_task();
        task.start_step(0);
        task.complete_step(0, Some(ToolResult::ok(json!({}), "ok")));
        task.start_step(1);
        task.fail_step(1, "File 'x' not found");

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("File 'x' not found"));
        assert_eq!(task.plan[0].status, StepStatus::Completed);
        assert_eq!(task.plan[1].status, StepStatus::Failed);
        assert_eq!(task.plan[2].status, StepStatus::Pending);
        assert_eq!(task.next_step_index(), Some(1));
        assert_eq!(task.failed_step_index(), Some(1));
    }

    #[test]
    fn restarting_a_failed_step_clears_error_state() {
        let mut task = three_step_task();
        task.start_step(0);
        task.fail_step(0, "boom");

        task.start_step(0);

        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.error.is_none());
        assert!(task.plan[0].error.is_none());
    }

    #[test]
    fn summary_lists_progress() {
        let mut task = three_step_task();
        for index in 0..3 {
            task.start_step(index);
            task.complete_step(index, None);
        }
        task.complete();

        let summary = task.summary();
        assert!(summary.starts_with("Task completed: build a page"));
        assert!(summary.contains("[x] three"));
        assert!(summary.contains("Progress: 3/3 steps completed"));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            json!("in_progress")
        );
    }
}
