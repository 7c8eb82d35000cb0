//! Remote document store adapter.
//!
//! # Responsibility
//! - Define the path-addressed document tree contract used by the board
//!   (`get/set/update/remove/push/subscribe`).
//! - Provide an in-process backend and a REST backend for hosted realtime
//!   databases.
//!
//! # Invariants
//! - Writing `null` deletes; empty objects and arrays are never stored.
//! - `update` applies every change of one call atomically.
//! - `.info/*` paths are read-only.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;
use tokio::task::JoinHandle;

mod memory;
pub mod path;
mod rest;
pub mod tree;

pub use memory::MemoryRemoteStore;
pub use rest::{RestOptions, RestRemoteStore};

/// Liveness path exposed by realtime databases.
pub const CONNECTED_PATH: &str = ".info/connected";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of one remote store call.
#[derive(Debug)]
pub enum StoreError {
    /// Path is malformed or addresses a read-only location.
    InvalidPath(String),
    /// Backend is offline or not reachable.
    Unavailable(String),
    /// HTTP transport failure.
    Transport(reqwest::Error),
    /// Backend answered with a non-success status.
    Remote { status: u16, body: String },
    Serialization(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid store path: `{path}`"),
            Self::Unavailable(message) => write!(f, "remote store unavailable: {message}"),
            Self::Transport(err) => write!(f, "remote transport error: {err}"),
            Self::Remote { status, body } => {
                write!(f, "remote store returned status {status}: {body}")
            }
            Self::Serialization(err) => write!(f, "invalid remote payload: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Path-addressed remote document tree.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short backend label used in log events.
    fn backend_name(&self) -> &'static str;

    /// Reads the value at `path`; `None` when nothing is stored there.
    async fn get(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Replaces the value at `path`.
    async fn set(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Multi-path update: every key of `changes` is a path relative to `path`.
    async fn update(&self, path: &str, changes: Map<String, Value>) -> StoreResult<()>;

    /// Removes the value at `path`.
    async fn remove(&self, path: &str) -> StoreResult<()>;

    /// Stores `value` under a generated child key of `path` and returns the key.
    async fn push(&self, path: &str, value: Value) -> StoreResult<String>;

    /// Subscribes to value changes at `path`.
    async fn subscribe(&self, path: &str) -> StoreResult<Subscription>;

    /// Reports whether the backend is currently connected.
    async fn is_connected(&self) -> bool {
        matches!(self.get(CONNECTED_PATH).await, Ok(Some(Value::Bool(true))))
    }
}

/// Live view of the value at one path.
///
/// Dropping the subscription stops delivery (and any background poller).
pub struct Subscription {
    path: String,
    receiver: watch::Receiver<Option<Value>>,
    poller: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(path: impl Into<String>, receiver: watch::Receiver<Option<Value>>) -> Self {
        Self {
            path: path.into(),
            receiver,
            poller: None,
        }
    }

    pub(crate) fn with_poller(
        path: impl Into<String>,
        receiver: watch::Receiver<Option<Value>>,
        poller: JoinHandle<()>,
    ) -> Self {
        Self {
            path: path.into(),
            receiver,
            poller: Some(poller),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Latest known value.
    pub fn current(&self) -> Option<Value> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next change. Returns `None` once the source is gone.
    pub async fn changed(&mut self) -> Option<Option<Value>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}
