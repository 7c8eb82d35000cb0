//! User account repository.

use super::collection::{merge, patch_fields, Collection};
use super::RepoResult;
use crate::model::profile::{initials_for, random_avatar_color};
use crate::model::user::{NewUser, User, UserPatch};
use crate::sync::SyncStore;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use std::sync::Arc;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Stores a new account with a lowercased email and generated profile.
    async fn create_user(&self, new_user: NewUser) -> RepoResult<User>;
    /// Stores `user` under its own id, replacing any existing record.
    async fn insert_user(&self, user: &User) -> RepoResult<()>;
    async fn update_user(&self, id: &str, patch: UserPatch) -> RepoResult<Option<User>>;
    async fn delete_user(&self, id: &str) -> RepoResult<bool>;
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup by email.
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// User repository backed by the `users` collection.
#[derive(Clone)]
pub struct SyncedUserRepository {
    records: Collection<User>,
}

impl SyncedUserRepository {
    pub fn new(store: Arc<SyncStore>) -> Self {
        Self {
            records: Collection::new(store),
        }
    }
}

#[async_trait]
impl UserRepository for SyncedUserRepository {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        self.records.list().await
    }

    async fn create_user(&self, new_user: NewUser) -> RepoResult<User> {
        let name = new_user.name.trim().to_string();
        let user = User {
            id: self.records.unused_id().await?,
            initials: initials_for(&name),
            name,
            email: new_user.email.trim().to_lowercase(),
            password: Some(new_user.password),
            color: random_avatar_color().to_string(),
            is_guest: false,
            created_at: Utc::now(),
            last_login: None,
        };
        self.records.insert(&user).await?;
        info!("event=user_create module=repo status=ok user_id={}", user.id);
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        self.records.insert(user).await
    }

    async fn update_user(&self, id: &str, mut patch: UserPatch) -> RepoResult<Option<User>> {
        let Some(existing) = self.records.find(id).await? else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            patch.initials = Some(initials_for(name));
        }
        if let Some(email) = patch.email.take() {
            patch.email = Some(email.trim().to_lowercase());
        }
        let changes = patch_fields(&patch)?;
        if changes.is_empty() {
            return Ok(Some(existing));
        }
        let updated = merge(&existing, &changes)?;
        self.records.patch(id, changes).await?;
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: &str) -> RepoResult<bool> {
        if self.records.find(id).await?.is_none() {
            return Ok(false);
        }
        self.records.remove(id).await?;
        info!("event=user_delete module=repo status=ok user_id={id}");
        Ok(true)
    }

    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        self.records.find(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let needle = email.trim().to_lowercase();
        Ok(self
            .records
            .list()
            .await?
            .into_iter()
            .find(|user| user.email.to_lowercase() == needle))
    }
}
