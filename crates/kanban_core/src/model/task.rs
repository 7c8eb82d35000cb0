//! Task records and board column vocabulary.

use super::Timestamp;
use crate::id::generate_id;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Board column a task sits in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    AwaitFeedback,
    Done,
}

impl TaskStatus {
    /// Columns in board order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::AwaitFeedback,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "to-do",
            Self::InProgress => "in-progress",
            Self::AwaitFeedback => "await-feedback",
            Self::Done => "done",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| format!("unknown task status `{value}`"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    #[serde(rename = "Technical Task")]
    TechnicalTask,
    #[serde(rename = "User Story")]
    UserStory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    /// Open subtask with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            completed: false,
        }
    }
}

/// Card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: TaskCategory,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    /// Contact ids. Absent in storage when empty.
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub created_at: Timestamp,
    pub created_by: String,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn is_assigned_to(&self, contact_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == contact_id)
    }

    /// `(completed, total)` subtask counts.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assigned_to: Vec<String>,
    pub subtasks: Vec<Subtask>,
}

impl NewTask {
    /// Minimal task: medium priority, `to-do`, no assignees or subtasks.
    pub fn new(title: impl Into<String>, category: TaskCategory, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category,
            due_date,
            priority: Priority::default(),
            status: TaskStatus::default(),
            assigned_to: Vec::new(),
            subtasks: Vec::new(),
        }
    }
}

/// Shallow patch applied by `TaskRepository::update_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Task, TaskCategory, TaskStatus};
    use serde_json::json;

    #[test]
    fn status_uses_column_names_on_the_wire() {
        assert_eq!(
            serde_json::to_value(TaskStatus::AwaitFeedback).unwrap(),
            json!("await-feedback")
        );
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("doing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn stored_task_without_empty_lists_decodes() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "title": "Plan",
            "category": "User Story",
            "dueDate": "2025-12-20",
            "priority": "urgent",
            "status": "to-do",
            "createdAt": "2024-01-01T10:00:00.000Z",
            "createdBy": "user_demo_1",
            "updatedAt": "2024-01-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(task.category, TaskCategory::UserStory);
        assert_eq!(task.priority, Priority::Urgent);
        assert!(task.assigned_to.is_empty());
        assert!(task.subtasks.is_empty());
        assert_eq!(task.description, "");
    }
}
