//! Contact repository.
//!
//! # Invariants
//! - Deleting a contact and unassigning it from every task is one atomic
//!   multi-path update; tasks that did not reference it are untouched.

use super::collection::{merge, patch_fields, Collection, StoredRecord};
use super::task_repo::SyncedTaskRepository;
use super::{ensure_persisted, RepoResult};
use crate::model::contact::{Contact, ContactPatch, NewContact};
use crate::model::profile::{initials_for, random_avatar_color};
use crate::model::user::User;
use crate::sync::SyncStore;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn list_contacts(&self) -> RepoResult<Vec<Contact>>;
    async fn create_contact(&self, new_contact: NewContact, created_by: &str) -> RepoResult<Contact>;
    /// Contact mirroring a registered user; shares the user's id.
    async fn create_linked_contact(&self, user: &User) -> RepoResult<Contact>;
    /// Recomputes initials when the name changes. `None` when missing.
    async fn update_contact(&self, id: &str, patch: ContactPatch) -> RepoResult<Option<Contact>>;
    /// Deletes the contact and strips it from task assignments.
    async fn delete_contact(&self, id: &str) -> RepoResult<bool>;
    async fn get_contact(&self, id: &str) -> RepoResult<Option<Contact>>;
}

/// Contact repository backed by the `contacts` collection.
#[derive(Clone)]
pub struct SyncedContactRepository {
    records: Collection<Contact>,
    tasks: SyncedTaskRepository,
}

impl SyncedContactRepository {
    pub fn new(store: Arc<SyncStore>) -> Self {
        Self {
            tasks: SyncedTaskRepository::new(Arc::clone(&store)),
            records: Collection::new(store),
        }
    }
}

#[async_trait]
impl ContactRepository for SyncedContactRepository {
    async fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        self.records.list().await
    }

    async fn create_contact(&self, new_contact: NewContact, created_by: &str) -> RepoResult<Contact> {
        let name = new_contact.name.trim().to_string();
        let contact = Contact {
            id: self.records.unused_id().await?,
            initials: initials_for(&name),
            name,
            email: new_contact.email.trim().to_string(),
            phone: new_contact.phone.trim().to_string(),
            color: random_avatar_color().to_string(),
            user_id: None,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
        };
        self.records.insert(&contact).await?;
        info!(
            "event=contact_create module=repo status=ok contact_id={}",
            contact.id
        );
        Ok(contact)
    }

    async fn create_linked_contact(&self, user: &User) -> RepoResult<Contact> {
        let contact = Contact {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: String::new(),
            initials: user.initials.clone(),
            color: user.color.clone(),
            user_id: Some(user.id.clone()),
            created_at: user.created_at,
            created_by: user.id.clone(),
        };
        self.records.insert(&contact).await?;
        Ok(contact)
    }

    async fn update_contact(&self, id: &str, mut patch: ContactPatch) -> RepoResult<Option<Contact>> {
        let Some(existing) = self.records.find(id).await? else {
            return Ok(None);
        };
        if let Some(name) = patch.name.take() {
            let name = name.trim().to_string();
            patch.initials = Some(initials_for(&name));
            patch.name = Some(name);
        }
        let changes = patch_fields(&patch)?;
        if changes.is_empty() {
            return Ok(Some(existing));
        }
        let updated = merge(&existing, &changes)?;
        self.records.patch(id, changes).await?;
        Ok(Some(updated))
    }

    async fn delete_contact(&self, id: &str) -> RepoResult<bool> {
        if self.records.find(id).await?.is_none() {
            return Ok(false);
        }
        let (mut changes, affected) = self.tasks.unassign_changes(id).await?;
        changes.insert(Collection::<Contact>::record_path(id), Value::Null);

        let outcome = self.records.store().update("", changes).await;
        ensure_persisted(outcome, Contact::COLLECTION, id)?;
        info!(
            "event=contact_delete module=repo status=ok contact_id={id} tasks_updated={affected}"
        );
        Ok(true)
    }

    async fn get_contact(&self, id: &str) -> RepoResult<Option<Contact>> {
        self.records.find(id).await
    }
}
