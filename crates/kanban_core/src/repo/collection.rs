//! Typed access to one collection of the synchronized store.

use super::{ensure_persisted, RepoError, RepoResult};
use crate::id::generate_id;
use crate::model::contact::Contact;
use crate::model::task::Task;
use crate::model::user::User;
use crate::model::Timestamp;
use crate::store::path::parse_writable_path;
use crate::sync::collection::map_to_array;
use crate::sync::SyncStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

const ID_ATTEMPTS: usize = 5;

/// Record type stored in a named collection.
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn created_at(&self) -> Timestamp;
}

impl StoredRecord for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl StoredRecord for Contact {
    const COLLECTION: &'static str = "contacts";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl StoredRecord for Task {
    const COLLECTION: &'static str = "tasks";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Codec + CRUD primitives for the collection of `T`.
pub struct Collection<T> {
    store: Arc<SyncStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: StoredRecord> Collection<T> {
    pub fn new(store: Arc<SyncStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    /// Store path of one record, relative to the root.
    pub fn record_path(id: &str) -> String {
        format!("{}/{id}", T::COLLECTION)
    }

    /// All records ordered by creation time, then id.
    pub async fn list(&self) -> RepoResult<Vec<T>> {
        let stored = self.store.get(T::COLLECTION).await;
        let mut records = map_to_array(stored.as_ref())
            .into_iter()
            .map(decode::<T>)
            .collect::<RepoResult<Vec<T>>>()?;
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(records)
    }

    pub async fn find(&self, id: &str) -> RepoResult<Option<T>> {
        if !is_valid_key(id) {
            return Ok(None);
        }
        match self.store.get(&Self::record_path(id)).await {
            Some(mut value) => {
                if let Value::Object(map) = &mut value {
                    map.entry("id")
                        .or_insert_with(|| Value::String(id.to_string()));
                }
                decode(value).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Writes the whole record under its id.
    pub async fn insert(&self, record: &T) -> RepoResult<()> {
        let path = Self::record_path(record.id());
        let outcome = self.store.save(&path, serde_json::to_value(record)?).await;
        ensure_persisted(outcome, T::COLLECTION, record.id())
    }

    /// Field-level update of one record.
    pub async fn patch(&self, id: &str, changes: Map<String, Value>) -> RepoResult<()> {
        let outcome = self.store.update(&Self::record_path(id), changes).await;
        ensure_persisted(outcome, T::COLLECTION, id)
    }

    pub async fn remove(&self, id: &str) -> RepoResult<()> {
        let outcome = self.store.delete(&Self::record_path(id)).await;
        ensure_persisted(outcome, T::COLLECTION, id)
    }

    /// Generates an id not yet present in the collection.
    pub async fn unused_id(&self) -> RepoResult<String> {
        let mut candidate = generate_id();
        for _ in 1..ID_ATTEMPTS {
            if self.find(&candidate).await?.is_none() {
                break;
            }
            candidate = generate_id();
        }
        Ok(candidate)
    }
}

/// Shallow merge of `changes` into `record`.
pub fn merge<T: StoredRecord>(record: &T, changes: &Map<String, Value>) -> RepoResult<T> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        for (key, change) in changes {
            fields.insert(key.clone(), change.clone());
        }
    }
    decode(value)
}

/// Serializes a patch struct into its changed fields.
pub fn patch_fields<P: Serialize>(patch: &P) -> RepoResult<Map<String, Value>> {
    match serde_json::to_value(patch)? {
        Value::Object(fields) => Ok(fields),
        _ => Ok(Map::new()),
    }
}

fn decode<T: StoredRecord>(value: Value) -> RepoResult<T> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();
    serde_json::from_value(value).map_err(|err| RepoError::InvalidData {
        collection: T::COLLECTION,
        message: format!("record `{id}`: {err}"),
    })
}

fn is_valid_key(id: &str) -> bool {
    !id.is_empty()
        && !id.contains('/')
        && parse_writable_path(id).is_ok_and(|segments| segments.len() == 1)
}
