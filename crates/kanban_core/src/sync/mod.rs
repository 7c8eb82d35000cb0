//! Two-tier store: remote document tree plus local mirror.
//!
//! # Responsibility
//! - Expose `get/save/update/delete/push/listen` over the remote store.
//! - Fall back to the local mirror when a remote read fails.
//! - Duplicate every write into the local mirror.
//!
//! # Invariants
//! - Adapter calls never return remote errors; failures are logged and
//!   reported through [`WriteOutcome`] or a cache fallback.
//! - Mirror entries are keyed by top-level collection name and hold the
//!   collection as an array of whole records. A field write for a record the
//!   mirror lacks copies the record from the remote instead.
//! - Writes the remote would reject as malformed reach neither tier.
//! - A successful remote read of a whole collection refreshes its mirror.
//! - Last writer wins; there is no retry or conflict detection.

pub mod collection;

use crate::cache::{CacheResult, LocalCache};
use crate::id::generate_id;
use crate::session::CURRENT_USER_KEY;
use crate::store::path::{is_info, parse_path, parse_update_paths};
use crate::store::{tree, RemoteStore, StoreError, StoreResult, Subscription};
use collection::{array_to_map, map_to_array};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// Result of one write through the adapter.
#[derive(Debug)]
pub struct WriteOutcome {
    /// Remote result; `Err` when the write only reached the mirror.
    pub remote: Result<(), StoreError>,
    /// Whether the local mirror was written.
    pub mirrored: bool,
}

impl WriteOutcome {
    /// Write reached the remote store.
    pub fn is_synced(&self) -> bool {
        self.remote.is_ok()
    }

    /// Write landed in at least one tier.
    pub fn is_persisted(&self) -> bool {
        self.remote.is_ok() || self.mirrored
    }

    pub fn remote_error(&self) -> Option<&StoreError> {
        self.remote.as_ref().err()
    }
}

type MirrorWrite = (Vec<String>, Option<Value>);

/// Remote store with a local fallback mirror.
pub struct SyncStore {
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    mirror_lock: Mutex<()>,
}

impl SyncStore {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache) -> Self {
        Self {
            remote,
            cache,
            mirror_lock: Mutex::new(()),
        }
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Reads `path`, preferring the remote store.
    ///
    /// Returns `None` when nothing is stored, or when the remote failed and
    /// the mirror has nothing either.
    pub async fn get(&self, path: &str) -> Option<Value> {
        let segments = match parse_path(path) {
            Ok(segments) => segments,
            Err(err) => {
                warn!("event=sync_get module=sync status=error path={path} error={err}");
                return None;
            }
        };

        match self.remote.get(path).await {
            Ok(value) => {
                if segments.len() == 1 && !is_info(&segments) {
                    self.refresh_mirror(&segments[0], value.as_ref());
                }
                value
            }
            Err(err) => {
                warn!(
                    "event=sync_get module=sync status=fallback backend={} path={path} error={err}",
                    self.remote.backend_name()
                );
                self.read_mirror(&segments)
            }
        }
    }

    /// Replaces the value at `path` remotely and in the mirror.
    pub async fn save(&self, path: &str, data: Value) -> WriteOutcome {
        let segments = match parse_path(path) {
            Ok(segments) => segments,
            Err(err) => return rejected(path, err),
        };
        let remote = self.remote.set(path, data.clone()).await;
        self.finish_write("save", path, remote, vec![(segments, Some(data))])
            .await
    }

    /// Multi-path update relative to `path`; see [`RemoteStore::update`].
    pub async fn update(&self, path: &str, changes: Map<String, Value>) -> WriteOutcome {
        let writes: Vec<MirrorWrite> = match parse_update_paths(path, &changes) {
            Ok(paths) => paths
                .into_iter()
                .zip(changes.values().cloned().map(Some))
                .collect(),
            Err(err) => return rejected(path, err),
        };
        let remote = self.remote.update(path, changes).await;
        self.finish_write("update", path, remote, writes).await
    }

    /// Removes `path` remotely and from the mirror.
    pub async fn delete(&self, path: &str) -> WriteOutcome {
        let segments = match parse_path(path) {
            Ok(segments) => segments,
            Err(err) => return rejected(path, err),
        };
        let remote = self.remote.remove(path).await;
        self.finish_write("delete", path, remote, vec![(segments, None)])
            .await
    }

    /// Appends `data` under a generated key of `path`.
    ///
    /// When the remote push fails the record is kept in the mirror under a
    /// locally generated key. Returns `None` only when neither tier stored it.
    pub async fn push(&self, path: &str, data: Value) -> Option<String> {
        let base = match parse_path(path) {
            Ok(segments) => segments,
            Err(err) => {
                warn!("event=sync_push module=sync status=error path={path} error={err}");
                return None;
            }
        };
        let (key, remote) = match self.remote.push(path, data.clone()).await {
            Ok(key) => (key, Ok(())),
            Err(err) => (generate_id(), Err(err)),
        };
        let mut segments = base;
        segments.push(key.clone());
        let outcome = self
            .finish_write("push", path, remote, vec![(segments, Some(data))])
            .await;
        outcome.is_persisted().then_some(key)
    }

    /// Subscribes to remote value changes at `path`.
    pub async fn listen(&self, path: &str) -> Option<Subscription> {
        match self.remote.subscribe(path).await {
            Ok(subscription) => {
                info!("event=sync_listen module=sync status=ok path={path}");
                Some(subscription)
            }
            Err(err) => {
                error!("event=sync_listen module=sync status=error path={path} error={err}");
                None
            }
        }
    }

    /// Liveness of the remote store (`.info/connected`).
    pub async fn is_connected(&self) -> bool {
        self.remote.is_connected().await
    }

    /// Uploads the mirrored value under `key` to `path` when the remote
    /// location is empty. Returns whether anything was uploaded.
    pub async fn migrate_local_to_remote(&self, key: &str, path: &str) -> StoreResult<bool> {
        let local = match self.cache.get_json::<Value>(key) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(false),
            Err(err) => {
                warn!("event=sync_migrate module=sync status=error key={key} error={err}");
                return Ok(false);
            }
        };
        if self.remote.get(path).await?.is_some() {
            info!("event=sync_migrate module=sync status=skipped key={key} path={path}");
            return Ok(false);
        }

        let payload = match local {
            Value::Array(items) => Value::Object(array_to_map(&items)),
            other => other,
        };
        if tree::is_empty(&payload) {
            return Ok(false);
        }
        self.remote.set(path, payload).await?;
        info!("event=sync_migrate module=sync status=ok key={key} path={path}");
        Ok(true)
    }

    /// Last mirror write for `collection`, in epoch milliseconds.
    pub fn mirror_updated_at(&self, collection: &str) -> Option<i64> {
        self.cache.updated_at(collection).ok().flatten()
    }

    async fn finish_write(
        &self,
        op: &'static str,
        path: &str,
        remote: StoreResult<()>,
        writes: Vec<MirrorWrite>,
    ) -> WriteOutcome {
        match &remote {
            Ok(()) => debug!("event=sync_{op} module=sync status=ok path={path}"),
            Err(err) => error!(
                "event=sync_{op} module=sync status=error backend={} path={path} error={err}",
                self.remote.backend_name()
            ),
        }

        let total = writes.len();
        let mirrored = match self.write_mirror(writes) {
            Ok(skipped) if skipped.is_empty() => true,
            Ok(skipped) => {
                let applied = skipped.len() < total;
                if remote.is_ok() {
                    self.mirror_whole_records(path, skipped).await || applied
                } else {
                    applied
                }
            }
            Err(err) => {
                error!("event=mirror_write module=sync status=error path={path} error={err}");
                false
            }
        };
        WriteOutcome { remote, mirrored }
    }

    /// Copies records the mirror did not hold from the remote store, whole.
    /// Returns whether any record was mirrored.
    async fn mirror_whole_records(&self, path: &str, records: Vec<Vec<String>>) -> bool {
        let mut writes = Vec::with_capacity(records.len());
        for segments in records {
            match self.remote.get(&segments.join("/")).await {
                Ok(record) => writes.push((segments, record)),
                Err(err) => warn!(
                    "event=mirror_fetch module=sync status=error path={path} error={err}"
                ),
            }
        }
        if writes.is_empty() {
            return false;
        }
        match self.write_mirror(writes) {
            Ok(skipped) => skipped.is_empty(),
            Err(err) => {
                error!("event=mirror_write module=sync status=error path={path} error={err}");
                false
            }
        }
    }

    fn refresh_mirror(&self, collection: &str, value: Option<&Value>) {
        let records = map_to_array(value);
        let result = match self.mirror_lock.lock() {
            Ok(_guard) => self.cache.set_json(collection, &records),
            Err(_) => return,
        };
        if let Err(err) = result {
            warn!("event=mirror_refresh module=sync status=error collection={collection} error={err}");
        }
    }

    fn read_mirror(&self, segments: &[String]) -> Option<Value> {
        let (collection, rest) = segments.split_first()?;
        let records = match self.cache.get_json::<Vec<Value>>(collection) {
            Ok(records) => records?,
            Err(err) => {
                warn!("event=mirror_read module=sync status=error collection={collection} error={err}");
                return None;
            }
        };
        let tree = Value::Object(array_to_map(&records));
        tree::read(&tree, rest).cloned()
    }

    /// Applies `writes` to the mirrored arrays. Writes below record level
    /// for records the mirror does not hold are skipped; their record paths
    /// (`[collection, id]`) are returned.
    fn write_mirror(&self, writes: Vec<MirrorWrite>) -> CacheResult<Vec<Vec<String>>> {
        let _guard = self
            .mirror_lock
            .lock()
            .map_err(|_| crate::cache::CacheError::Poisoned)?;

        let mut skipped: Vec<Vec<String>> = Vec::new();
        for (segments, value) in writes {
            let Some((collection, rest)) = segments.split_first() else {
                self.replace_all_mirrors(value)?;
                continue;
            };
            if is_info(&segments) {
                continue;
            }
            let records = self
                .cache
                .get_json::<Vec<Value>>(collection)?
                .unwrap_or_default();
            let mut tree = Value::Object(array_to_map(&records));
            if rest.len() > 1 && tree::read(&tree, &rest[..1]).is_none() {
                let record = segments[..2].to_vec();
                if !skipped.contains(&record) {
                    skipped.push(record);
                }
                continue;
            }
            tree::write(&mut tree, rest, value);
            self.cache
                .set_json(collection, &map_to_array(Some(&tree)))?;
        }
        Ok(skipped)
    }

    fn replace_all_mirrors(&self, value: Option<Value>) -> CacheResult<()> {
        for key in self.cache.keys()? {
            if key != CURRENT_USER_KEY {
                self.cache.remove_item(&key)?;
            }
        }
        if let Some(Value::Object(collections)) = value.and_then(tree::prune) {
            for (collection, data) in collections {
                self.cache
                    .set_json(&collection, &map_to_array(Some(&data)))?;
            }
        }
        Ok(())
    }
}

fn rejected(path: &str, err: StoreError) -> WriteOutcome {
    warn!("event=sync_write module=sync status=rejected path={path} error={err}");
    WriteOutcome {
        remote: Err(err),
        mirrored: false,
    }
}
