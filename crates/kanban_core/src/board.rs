//! Board context: one synchronized store plus the repositories, services and
//! session built on it.

use crate::cache::{CacheError, LocalCache};
use crate::config::{BoardConfig, RemoteKind};
use crate::repo::contact_repo::SyncedContactRepository;
use crate::repo::task_repo::SyncedTaskRepository;
use crate::repo::user_repo::SyncedUserRepository;
use crate::seed::DemoSeeder;
use crate::service::auth_service::AuthService;
use crate::service::contact_service::ContactService;
use crate::service::task_service::TaskService;
use crate::session::{Session, CURRENT_USER_KEY};
use crate::store::{MemoryRemoteStore, RemoteStore, RestRemoteStore, StoreError};
use crate::sync::collection::array_to_map;
use crate::sync::SyncStore;
use log::info;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum BoardError {
    Cache(CacheError),
    Remote(StoreError),
    MissingDatabaseUrl,
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache(err) => write!(f, "failed to open local cache: {err}"),
            Self::Remote(err) => write!(f, "failed to configure remote store: {err}"),
            Self::MissingDatabaseUrl => write!(f, "REST remote requires a database url"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cache(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::MissingDatabaseUrl => None,
        }
    }
}

impl From<CacheError> for BoardError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl From<StoreError> for BoardError {
    fn from(value: StoreError) -> Self {
        Self::Remote(value)
    }
}

/// Shared handle to everything operating on one board.
#[derive(Clone)]
pub struct Board {
    store: Arc<SyncStore>,
}

impl Board {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache) -> Self {
        Self {
            store: Arc::new(SyncStore::new(remote, cache)),
        }
    }

    /// In-process store with an in-memory cache.
    pub fn in_memory() -> Result<Self, BoardError> {
        Ok(Self::new(
            Arc::new(MemoryRemoteStore::new()),
            LocalCache::open_in_memory()?,
        ))
    }

    /// Builds the remote backend and cache described by `config`.
    pub fn open(config: &BoardConfig) -> Result<Self, BoardError> {
        let cache = match &config.cache.path {
            Some(path) => LocalCache::open(path)?,
            None => LocalCache::open_in_memory()?,
        };
        let remote: Arc<dyn RemoteStore> = match config.remote.kind {
            RemoteKind::Memory => Arc::new(MemoryRemoteStore::with_data(mirror_snapshot(&cache)?)),
            RemoteKind::Rest => {
                let url = config
                    .remote
                    .database_url
                    .as_deref()
                    .ok_or(BoardError::MissingDatabaseUrl)?;
                Arc::new(RestRemoteStore::new(url, config.remote.rest_options())?)
            }
        };
        info!(
            "event=board_open module=board status=ok backend={} cache={}",
            remote.backend_name(),
            config
                .cache
                .path
                .as_ref()
                .map_or_else(|| "memory".to_string(), |path| path.display().to_string())
        );
        Ok(Self::new(remote, cache))
    }

    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.store))
    }

    pub fn users(&self) -> SyncedUserRepository {
        SyncedUserRepository::new(Arc::clone(&self.store))
    }

    pub fn contacts(&self) -> SyncedContactRepository {
        SyncedContactRepository::new(Arc::clone(&self.store))
    }

    pub fn tasks(&self) -> SyncedTaskRepository {
        SyncedTaskRepository::new(Arc::clone(&self.store))
    }

    pub fn auth_service(&self) -> AuthService<SyncedUserRepository, SyncedContactRepository> {
        AuthService::new(self.users(), self.contacts(), self.session())
    }

    pub fn contact_service(&self) -> ContactService<SyncedContactRepository> {
        ContactService::new(self.contacts())
    }

    pub fn task_service(&self) -> TaskService<SyncedTaskRepository> {
        TaskService::new(self.tasks())
    }

    pub fn seeder(&self) -> DemoSeeder {
        DemoSeeder::new(Arc::clone(&self.store))
    }
}

/// Rebuilds a document tree from the mirrored collections, so an in-process
/// store picks up where the previous process left off.
fn mirror_snapshot(cache: &LocalCache) -> Result<Value, CacheError> {
    let mut root = Map::new();
    for key in cache.keys()? {
        if key == CURRENT_USER_KEY {
            continue;
        }
        if let Some(records) = cache.get_json::<Vec<Value>>(&key)? {
            root.insert(key, Value::Object(array_to_map(&records)));
        }
    }
    Ok(Value::Object(root))
}
