use super::demo_data::{demo_contacts, demo_tasks, demo_users};
use crate::model::contact::Contact;
use crate::model::task::Task;
use crate::repo::collection::StoredRecord;
use crate::repo::contact_repo::{ContactRepository, SyncedContactRepository};
use crate::repo::user_repo::{SyncedUserRepository, UserRepository};
use crate::repo::RepoError;
use crate::sync::collection::array_to_map;
use crate::sync::SyncStore;
use chrono::Utc;
use log::{error, info};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Debug)]
pub enum SeedError {
    /// The remote store rejected the demo-data write.
    Upload(String),
    Serialization(serde_json::Error),
    Repo(RepoError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload(message) => write!(f, "failed to upload demo data: {message}"),
            Self::Serialization(err) => write!(f, "failed to encode demo data: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Upload(_) => None,
        }
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<RepoError> for SeedError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Record counts of the seeded collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoDataStatus {
    pub contacts_count: usize,
    pub tasks_count: usize,
}

impl DemoDataStatus {
    pub fn contacts_exist(&self) -> bool {
        self.contacts_count > 0
    }

    pub fn tasks_exist(&self) -> bool {
        self.tasks_count > 0
    }

    pub fn all_exist(&self) -> bool {
        self.contacts_exist() && self.tasks_exist()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Both collections already had data; nothing was written.
    Skipped(DemoDataStatus),
    Uploaded { contacts: usize, tasks: usize },
}

/// Seeds the demo board into a store.
pub struct DemoSeeder {
    store: Arc<SyncStore>,
    users: SyncedUserRepository,
    contacts: SyncedContactRepository,
}

impl DemoSeeder {
    pub fn new(store: Arc<SyncStore>) -> Self {
        Self {
            users: SyncedUserRepository::new(Arc::clone(&store)),
            contacts: SyncedContactRepository::new(Arc::clone(&store)),
            store,
        }
    }

    /// Counts the stored contacts and tasks. Unreadable collections count as
    /// empty.
    pub async fn check(&self) -> DemoDataStatus {
        DemoDataStatus {
            contacts_count: self.count(Contact::COLLECTION).await,
            tasks_count: self.count(Task::COLLECTION).await,
        }
    }

    /// Uploads the demo contacts and tasks. Without `force` the upload is
    /// skipped when both collections already hold data; a partial set is
    /// overwritten.
    pub async fn upload(&self, force: bool) -> SeedResult<SeedOutcome> {
        if !force {
            let status = self.check().await;
            if status.all_exist() {
                info!(
                    "event=seed_upload module=seed status=skipped contacts={} tasks={}",
                    status.contacts_count, status.tasks_count
                );
                return Ok(SeedOutcome::Skipped(status));
            }
        }
        self.write_demo_set().await
    }

    /// Uploads contacts and tasks unless present, then seeds demo users.
    /// Returns the upload outcome and the number of demo users created.
    ///
    /// Linked contacts of the demo users are written after the collection upload.
    pub async fn initialize(&self) -> SeedResult<(SeedOutcome, usize)> {
        let outcome = self.upload(false).await?;
        let users = self.ensure_demo_users().await?;
        Ok((outcome, users))
    }

    /// Replaces both collections with exactly the demo set.
    pub async fn reset(&self) -> SeedResult<SeedOutcome> {
        info!("event=seed_reset module=seed status=start");
        self.write_demo_set().await
    }

    /// Stores the demo accounts and their linked contacts when no user
    /// exists yet. Returns the number of users created.
    pub async fn ensure_demo_users(&self) -> SeedResult<usize> {
        if !self.users.list_users().await?.is_empty() {
            return Ok(0);
        }
        let users = demo_users(Utc::now());
        for user in &users {
            self.users.insert_user(user).await?;
            self.contacts.create_linked_contact(user).await?;
        }
        info!("event=seed_users module=seed status=ok users={}", users.len());
        Ok(users.len())
    }

    async fn write_demo_set(&self) -> SeedResult<SeedOutcome> {
        let contacts = encode(&demo_contacts())?;
        let tasks = encode(&demo_tasks())?;
        let (contacts_count, tasks_count) = (contacts.len(), tasks.len());

        let mut changes = Map::new();
        changes.insert(Contact::COLLECTION.to_string(), Value::Object(contacts));
        changes.insert(Task::COLLECTION.to_string(), Value::Object(tasks));

        let outcome = self.store.update("", changes).await;
        if let Some(err) = outcome.remote_error() {
            error!("event=seed_upload module=seed status=error error={err}");
            return Err(SeedError::Upload(err.to_string()));
        }
        info!(
            "event=seed_upload module=seed status=ok contacts={contacts_count} tasks={tasks_count}"
        );
        Ok(SeedOutcome::Uploaded {
            contacts: contacts_count,
            tasks: tasks_count,
        })
    }

    async fn count(&self, collection: &str) -> usize {
        match self.store.get(collection).await {
            Some(Value::Object(records)) => records.len(),
            Some(Value::Array(records)) => records.iter().filter(|r| !r.is_null()).count(),
            _ => 0,
        }
    }
}

fn encode<T: serde::Serialize>(records: &[T]) -> SeedResult<Map<String, Value>> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(array_to_map(&values))
}
