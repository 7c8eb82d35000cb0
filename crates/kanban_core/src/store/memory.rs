//! In-process document store.
//!
//! Behaves like a hosted realtime database (same path and pruning rules,
//! atomic multi-path updates, value subscriptions) without a network. The
//! connection flag can be toggled to exercise offline fallbacks.

use super::path::{is_info, overlaps, parse_path, parse_update_paths, parse_writable_path};
use super::tree;
use super::{RemoteStore, StoreError, StoreResult, Subscription, CONNECTED_PATH};
use crate::id::generate_id;
use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::{watch, RwLock};

struct Watcher {
    segments: Vec<String>,
    sender: watch::Sender<Option<Value>>,
}

/// Document tree held in process memory.
pub struct MemoryRemoteStore {
    root: RwLock<Value>,
    watchers: Mutex<Vec<Watcher>>,
    connected: AtomicBool,
    connected_tx: watch::Sender<Option<Value>>,
    writes: AtomicU64,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::with_data(Value::Null)
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `data` (pruned like any write).
    pub fn with_data(data: Value) -> Self {
        let (connected_tx, _) = watch::channel(Some(Value::Bool(true)));
        Self {
            root: RwLock::new(tree::prune(data).unwrap_or(Value::Null)),
            watchers: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
            connected_tx,
            writes: AtomicU64::new(0),
        }
    }

    /// Simulates losing or regaining the connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        self.connected_tx.send_replace(Some(Value::Bool(connected)));
    }

    /// Number of successful write calls (`set/update/remove/push`).
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    fn ensure_connected(&self) -> StoreResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        }
    }

    async fn apply(&self, writes: Vec<(Vec<String>, Option<Value>)>) {
        let mut root = self.root.write().await;
        for (segments, value) in &writes {
            tree::write(&mut root, segments, value.clone());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify(&root, &writes);
    }

    fn notify(&self, root: &Value, writes: &[(Vec<String>, Option<Value>)]) {
        let Ok(mut watchers) = self.watchers.lock() else {
            return;
        };
        watchers.retain(|watcher| !watcher.sender.is_closed());
        for watcher in watchers.iter() {
            let touched = writes
                .iter()
                .any(|(segments, _)| overlaps(segments, &watcher.segments));
            if !touched {
                continue;
            }
            let next = tree::read(root, &watcher.segments).cloned();
            watcher.sender.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        }
    }
}

fn is_connected_path(segments: &[String]) -> bool {
    segments.join("/") == CONNECTED_PATH
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let segments = parse_path(path)?;
        if is_info(&segments) {
            return Ok(is_connected_path(&segments)
                .then(|| Value::Bool(self.connected.load(Ordering::SeqCst))));
        }
        self.ensure_connected()?;
        let root = self.root.read().await;
        Ok(tree::read(&root, &segments).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let segments = parse_writable_path(path)?;
        self.ensure_connected()?;
        debug!("event=store_set module=store backend=memory path={path}");
        self.apply(vec![(segments, Some(value))]).await;
        Ok(())
    }

    async fn update(&self, path: &str, changes: Map<String, Value>) -> StoreResult<()> {
        let paths = parse_update_paths(path, &changes)?;
        let writes: Vec<_> = paths
            .into_iter()
            .zip(changes.into_values())
            .map(|(segments, value)| (segments, Some(value)))
            .collect();
        self.ensure_connected()?;
        if writes.is_empty() {
            return Ok(());
        }
        debug!(
            "event=store_update module=store backend=memory path={path} changes={}",
            writes.len()
        );
        self.apply(writes).await;
        Ok(())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        let segments = parse_writable_path(path)?;
        self.ensure_connected()?;
        debug!("event=store_remove module=store backend=memory path={path}");
        self.apply(vec![(segments, None)]).await;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> StoreResult<String> {
        let mut segments = parse_writable_path(path)?;
        self.ensure_connected()?;
        let key = generate_id();
        segments.push(key.clone());
        self.apply(vec![(segments, Some(value))]).await;
        Ok(key)
    }

    async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        let segments = parse_path(path)?;
        if is_info(&segments) {
            if !is_connected_path(&segments) {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            return Ok(Subscription::new(path, self.connected_tx.subscribe()));
        }
        self.ensure_connected()?;

        // Registered under the read lock so no write slips between the
        // initial snapshot and the first notification.
        let root = self.root.read().await;
        let (sender, receiver) = watch::channel(tree::read(&root, &segments).cloned());
        self.watchers
            .lock()
            .map_err(|_| StoreError::Unavailable("subscription registry poisoned".to_string()))?
            .push(Watcher { segments, sender });
        drop(root);
        Ok(Subscription::new(path, receiver))
    }
}
