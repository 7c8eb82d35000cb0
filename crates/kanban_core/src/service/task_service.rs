//! Board and task use cases.
//!
//! # Responsibility
//! - Validate task drafts before creation.
//! - Provide column moves, subtask edits, search and summary statistics.
//!
//! # Invariants
//! - Every mutation goes through `TaskRepository::update_task`, so
//!   `updatedAt` is always refreshed.
//! - Statistics are computed from one consistent list read.

use crate::model::task::{
    NewTask, Priority, Subtask, Task, TaskCategory, TaskPatch, TaskStatus,
};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

#[derive(Debug)]
pub enum TaskServiceError {
    MissingTitle,
    MissingDueDate,
    MissingCategory,
    TaskNotFound(String),
    SubtaskNotFound { task_id: String, subtask_id: String },
    EmptySubtaskTitle,
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "title is required"),
            Self::MissingDueDate => write!(f, "due date is required"),
            Self::MissingCategory => write!(f, "category is required"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::SubtaskNotFound {
                task_id,
                subtask_id,
            } => write!(f, "subtask `{subtask_id}` not found on task `{task_id}`"),
            Self::EmptySubtaskTitle => write!(f, "subtask title cannot be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Add-task form input; required fields are optional until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: Option<TaskCategory>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assigned_to: Vec<String>,
    /// Subtask titles; blank entries are dropped.
    pub subtasks: Vec<String>,
}

impl TaskDraft {
    pub fn validate(self) -> TaskServiceResult<NewTask> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskServiceError::MissingTitle);
        }
        let due_date = self.due_date.ok_or(TaskServiceError::MissingDueDate)?;
        let category = self.category.ok_or(TaskServiceError::MissingCategory)?;
        Ok(NewTask {
            title,
            description: self.description.trim().to_string(),
            category,
            due_date,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to,
            subtasks: self
                .subtasks
                .iter()
                .map(|title| title.trim())
                .filter(|title| !title.is_empty())
                .map(Subtask::new)
                .collect(),
        })
    }
}

/// One board column with its cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// Summary-page counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatistics {
    pub total: usize,
    pub to_do: usize,
    pub in_progress: usize,
    pub await_feedback: usize,
    pub done: usize,
    pub urgent: usize,
    /// Earliest due date among urgent tasks that are not done.
    pub next_urgent_deadline: Option<NaiveDate>,
}

impl TaskStatistics {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        Self {
            total: tasks.len(),
            to_do: count(TaskStatus::ToDo),
            in_progress: count(TaskStatus::InProgress),
            await_feedback: count(TaskStatus::AwaitFeedback),
            done: count(TaskStatus::Done),
            urgent: tasks
                .iter()
                .filter(|t| t.priority == Priority::Urgent)
                .count(),
            next_urgent_deadline: tasks
                .iter()
                .filter(|t| t.priority == Priority::Urgent && t.status != TaskStatus::Done)
                .map(|t| t.due_date)
                .min(),
        }
    }

    pub fn count_for(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::ToDo => self.to_do,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::AwaitFeedback => self.await_feedback,
            TaskStatus::Done => self.done,
        }
    }
}

pub struct TaskService<T: TaskRepository> {
    repo: T,
}

impl<T: TaskRepository> TaskService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    pub async fn create_task(&self, draft: TaskDraft, created_by: &str) -> TaskServiceResult<Task> {
        let new_task = draft.validate()?;
        Ok(self.repo.create_task(new_task, created_by).await?)
    }

    pub async fn get_task(&self, id: &str) -> TaskServiceResult<Option<Task>> {
        Ok(self.repo.get_task(id).await?)
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> TaskServiceResult<Task> {
        self.repo
            .update_task(id, patch)
            .await?
            .ok_or_else(|| TaskServiceError::TaskNotFound(id.to_string()))
    }

    pub async fn delete_task(&self, id: &str) -> TaskServiceResult<bool> {
        Ok(self.repo.delete_task(id).await?)
    }

    /// Drops a card into `status`.
    pub async fn move_task(&self, id: &str, status: TaskStatus) -> TaskServiceResult<Task> {
        let task = self.update_task(id, TaskPatch::status(status)).await?;
        info!("event=task_move module=service status=ok task_id={id} column={status}");
        Ok(task)
    }

    pub async fn add_subtask(&self, task_id: &str, title: &str) -> TaskServiceResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskServiceError::EmptySubtaskTitle);
        }
        let mut subtasks = self.require(task_id).await?.subtasks;
        subtasks.push(Subtask::new(title));
        self.replace_subtasks(task_id, subtasks).await
    }

    pub async fn toggle_subtask(&self, task_id: &str, subtask_id: &str) -> TaskServiceResult<Task> {
        let mut subtasks = self.require(task_id).await?.subtasks;
        let subtask = find_subtask(&mut subtasks, task_id, subtask_id)?;
        subtask.completed = !subtask.completed;
        self.replace_subtasks(task_id, subtasks).await
    }

    /// Renames a subtask; a title equal to the current one is a no-op.
    pub async fn rename_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        title: &str,
    ) -> TaskServiceResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskServiceError::EmptySubtaskTitle);
        }
        let task = self.require(task_id).await?;
        let mut subtasks = task.subtasks.clone();
        let subtask = find_subtask(&mut subtasks, task_id, subtask_id)?;
        if subtask.title == title {
            return Ok(task);
        }
        subtask.title = title.to_string();
        self.replace_subtasks(task_id, subtasks).await
    }

    pub async fn remove_subtask(&self, task_id: &str, subtask_id: &str) -> TaskServiceResult<Task> {
        let mut subtasks = self.require(task_id).await?.subtasks;
        let before = subtasks.len();
        subtasks.retain(|subtask| subtask.id != subtask_id);
        if subtasks.len() == before {
            return Err(TaskServiceError::SubtaskNotFound {
                task_id: task_id.to_string(),
                subtask_id: subtask_id.to_string(),
            });
        }
        self.replace_subtasks(task_id, subtasks).await
    }

    pub async fn tasks_by_status(&self, status: TaskStatus) -> TaskServiceResult<Vec<Task>> {
        let mut tasks = self.repo.list_tasks().await?;
        tasks.retain(|task| task.status == status);
        Ok(tasks)
    }

    /// All four columns in board order, empty ones included.
    pub async fn board(&self) -> TaskServiceResult<Vec<BoardColumn>> {
        Ok(group_into_columns(self.repo.list_tasks().await?))
    }

    /// Case-insensitive match on title or description; blank terms match all.
    pub async fn search(&self, term: &str) -> TaskServiceResult<Vec<Task>> {
        let tasks = self.repo.list_tasks().await?;
        Ok(filter_by_term(tasks, term))
    }

    pub async fn urgent_tasks(&self) -> TaskServiceResult<Vec<Task>> {
        let mut tasks = self.repo.list_tasks().await?;
        tasks.retain(|task| task.priority == Priority::Urgent);
        Ok(tasks)
    }

    pub async fn statistics(&self) -> TaskServiceResult<TaskStatistics> {
        let tasks = self.repo.list_tasks().await?;
        Ok(TaskStatistics::from_tasks(&tasks))
    }

    async fn require(&self, id: &str) -> TaskServiceResult<Task> {
        self.repo
            .get_task(id)
            .await?
            .ok_or_else(|| TaskServiceError::TaskNotFound(id.to_string()))
    }

    async fn replace_subtasks(&self, id: &str, subtasks: Vec<Subtask>) -> TaskServiceResult<Task> {
        let patch = TaskPatch {
            subtasks: Some(subtasks),
            ..TaskPatch::default()
        };
        self.update_task(id, patch).await
    }
}

fn find_subtask<'a>(
    subtasks: &'a mut [Subtask],
    task_id: &str,
    subtask_id: &str,
) -> TaskServiceResult<&'a mut Subtask> {
    subtasks
        .iter_mut()
        .find(|subtask| subtask.id == subtask_id)
        .ok_or_else(|| TaskServiceError::SubtaskNotFound {
            task_id: task_id.to_string(),
            subtask_id: subtask_id.to_string(),
        })
}

fn group_into_columns(tasks: Vec<Task>) -> Vec<BoardColumn> {
    let mut columns: Vec<BoardColumn> = TaskStatus::ALL
        .into_iter()
        .map(|status| BoardColumn {
            status,
            tasks: Vec::new(),
        })
        .collect();
    for task in tasks {
        if let Some(column) = columns.iter_mut().find(|c| c.status == task.status) {
            column.tasks.push(task);
        }
    }
    columns
}

fn filter_by_term(tasks: Vec<Task>, term: &str) -> Vec<Task> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return tasks;
    }
    tasks
        .into_iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&term)
                || task.description.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_by_term, group_into_columns, TaskDraft, TaskServiceError, TaskStatistics};
    use crate::model::task::{Priority, Task, TaskCategory, TaskStatus};
    use chrono::{NaiveDate, Utc};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, day).unwrap()
    }

    fn task(id: &str, status: TaskStatus, priority: Priority, due: u32) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: "Shared login flow".to_string(),
            category: TaskCategory::TechnicalTask,
            due_date: date(due),
            priority,
            status,
            assigned_to: Vec::new(),
            subtasks: Vec::new(),
            created_at: now,
            created_by: "guest".to_string(),
            updated_at: now,
        }
    }

    #[test]
    fn draft_requires_title_due_date_and_category() {
        let missing_title = TaskDraft {
            title: "  ".to_string(),
            ..TaskDraft::default()
        };
        assert!(matches!(
            missing_title.validate(),
            Err(TaskServiceError::MissingTitle)
        ));

        let missing_date = TaskDraft {
            title: "Ship".to_string(),
            category: Some(TaskCategory::UserStory),
            ..TaskDraft::default()
        };
        assert!(matches!(
            missing_date.validate(),
            Err(TaskServiceError::MissingDueDate)
        ));

        let missing_category = TaskDraft {
            title: "Ship".to_string(),
            due_date: Some(date(1)),
            ..TaskDraft::default()
        };
        assert!(matches!(
            missing_category.validate(),
            Err(TaskServiceError::MissingCategory)
        ));
    }

    #[test]
    fn draft_drops_blank_subtasks() {
        let new_task = TaskDraft {
            title: " Ship ".to_string(),
            category: Some(TaskCategory::UserStory),
            due_date: Some(date(1)),
            subtasks: vec!["Write docs".to_string(), "   ".to_string()],
            ..TaskDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(new_task.title, "Ship");
        assert_eq!(new_task.subtasks.len(), 1);
        assert!(!new_task.subtasks[0].completed);
    }

    #[test]
    fn statistics_track_next_open_urgent_deadline() {
        let stats = TaskStatistics::from_tasks(&[
            task("a", TaskStatus::Done, Priority::Urgent, 1),
            task("b", TaskStatus::ToDo, Priority::Urgent, 20),
            task("c", TaskStatus::InProgress, Priority::Urgent, 10),
            task("d", TaskStatus::ToDo, Priority::Low, 2),
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.to_do, 2);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.urgent, 3);
        assert_eq!(stats.next_urgent_deadline, Some(date(10)));
    }

    #[test]
    fn board_has_every_column_in_order() {
        let columns = group_into_columns(vec![task("a", TaskStatus::Done, Priority::Low, 1)]);
        let order: Vec<TaskStatus> = columns.iter().map(|c| c.status).collect();
        assert_eq!(order, TaskStatus::ALL.to_vec());
        assert_eq!(columns[3].tasks.len(), 1);
        assert!(columns[0].tasks.is_empty());
    }

    #[test]
    fn search_matches_title_or_description_ignoring_case() {
        let tasks = vec![task("a", TaskStatus::ToDo, Priority::Low, 1)];
        assert_eq!(filter_by_term(tasks.clone(), "LOGIN").len(), 1);
        assert_eq!(filter_by_term(tasks.clone(), "task A").len(), 1);
        assert_eq!(filter_by_term(tasks.clone(), "").len(), 1);
        assert!(filter_by_term(tasks, "payments").is_empty());
    }
}
