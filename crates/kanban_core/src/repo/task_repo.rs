//! Task repository.
//!
//! # Invariants
//! - Every update refreshes `updatedAt`, including updates with no other field.
//! - Removing a contact touches only tasks that referenced it.

use super::collection::{merge, patch_fields, Collection, StoredRecord};
use super::{ensure_persisted, RepoResult};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::sync::SyncStore;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    async fn create_task(&self, new_task: NewTask, created_by: &str) -> RepoResult<Task>;
    /// Returns `None` when no task has `id`.
    async fn update_task(&self, id: &str, patch: TaskPatch) -> RepoResult<Option<Task>>;
    /// Returns `false` when no task has `id`.
    async fn delete_task(&self, id: &str) -> RepoResult<bool>;
    async fn get_task(&self, id: &str) -> RepoResult<Option<Task>>;
    /// Strips `contact_id` from every assignment list; returns the number of
    /// tasks changed.
    async fn remove_contact_from_tasks(&self, contact_id: &str) -> RepoResult<usize>;
}

/// Task repository backed by the `tasks` collection.
#[derive(Clone)]
pub struct SyncedTaskRepository {
    records: Collection<Task>,
}

impl SyncedTaskRepository {
    pub fn new(store: Arc<SyncStore>) -> Self {
        Self {
            records: Collection::new(store),
        }
    }

    /// Root-relative multi-path changes that unassign `contact_id`, plus the
    /// number of affected tasks.
    pub(crate) async fn unassign_changes(
        &self,
        contact_id: &str,
    ) -> RepoResult<(Map<String, Value>, usize)> {
        let now = Utc::now();
        let mut changes = Map::new();
        let mut affected = 0;
        for task in self.records.list().await? {
            if !task.is_assigned_to(contact_id) {
                continue;
            }
            let remaining: Vec<&String> = task
                .assigned_to
                .iter()
                .filter(|id| id.as_str() != contact_id)
                .collect();
            let base = Collection::<Task>::record_path(&task.id);
            changes.insert(format!("{base}/assignedTo"), json!(remaining));
            changes.insert(format!("{base}/updatedAt"), json!(now));
            affected += 1;
        }
        Ok((changes, affected))
    }
}

#[async_trait]
impl TaskRepository for SyncedTaskRepository {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.records.list().await
    }

    async fn create_task(&self, new_task: NewTask, created_by: &str) -> RepoResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: self.records.unused_id().await?,
            title: new_task.title,
            description: new_task.description,
            category: new_task.category,
            due_date: new_task.due_date,
            priority: new_task.priority,
            status: new_task.status,
            assigned_to: new_task.assigned_to,
            subtasks: new_task.subtasks,
            created_at: now,
            created_by: created_by.to_string(),
            updated_at: now,
        };
        self.records.insert(&task).await?;
        info!(
            "event=task_create module=repo status=ok task_id={} column={}",
            task.id, task.status
        );
        Ok(task)
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> RepoResult<Option<Task>> {
        let Some(existing) = self.records.find(id).await? else {
            return Ok(None);
        };
        let mut changes = patch_fields(&patch)?;
        changes.insert("updatedAt".to_string(), json!(Utc::now()));
        let updated = merge(&existing, &changes)?;
        self.records.patch(id, changes).await?;
        Ok(Some(updated))
    }

    async fn delete_task(&self, id: &str) -> RepoResult<bool> {
        if self.records.find(id).await?.is_none() {
            return Ok(false);
        }
        self.records.remove(id).await?;
        info!("event=task_delete module=repo status=ok task_id={id}");
        Ok(true)
    }

    async fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        self.records.find(id).await
    }

    async fn remove_contact_from_tasks(&self, contact_id: &str) -> RepoResult<usize> {
        let (changes, affected) = self.unassign_changes(contact_id).await?;
        if affected == 0 {
            return Ok(0);
        }
        let outcome = self.records.store().update("", changes).await;
        ensure_persisted(outcome, Task::COLLECTION, contact_id)?;
        Ok(affected)
    }
}
