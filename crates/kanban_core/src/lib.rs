//! Data layer for a kanban board backed by a realtime document store.
//! Owns persistence, offline fallback, demo seeding and board use cases.

pub mod board;
pub mod cache;
pub mod config;
pub mod db;
pub mod id;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;
pub mod session;
pub mod store;
pub mod sync;

pub use board::{Board, BoardError};
pub use cache::{CacheError, LocalCache};
pub use config::{BoardConfig, ConfigError, RemoteKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::contact::{Contact, ContactPatch, NewContact};
pub use model::task::{NewTask, Priority, Subtask, Task, TaskCategory, TaskPatch, TaskStatus};
pub use model::user::{NewUser, User, UserPatch};
pub use repo::contact_repo::{ContactRepository, SyncedContactRepository};
pub use repo::task_repo::{SyncedTaskRepository, TaskRepository};
pub use repo::user_repo::{SyncedUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use seed::{DemoDataStatus, DemoSeeder, SeedError, SeedOutcome};
pub use session::Session;
pub use store::{MemoryRemoteStore, RemoteStore, RestOptions, RestRemoteStore, StoreError};
pub use sync::{SyncStore, WriteOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
