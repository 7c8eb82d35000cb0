//! Local persistent key/value cache.
//!
//! # Responsibility
//! - Hold the local mirror of each collection (array-serialized JSON) and the
//!   current-user session entry.
//! - Record the last write time of each entry so callers can judge staleness.
//!
//! # Invariants
//! - Values are stored as JSON text; a key holds at most one value.
//! - All access to the SQLite connection is serialised by one mutex.

use crate::db::{open_db, open_db_in_memory, DbError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    Serialization(serde_json::Error),
    Poisoned,
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid cached value: {err}"),
            Self::Poisoned => write!(f, "local cache lock poisoned"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// SQLite-backed replacement for browser local storage.
pub struct LocalCache {
    conn: Mutex<Connection>,
}

impl LocalCache {
    /// Opens (or creates) a cache file.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a cache that lives only as long as this value.
    pub fn open_in_memory() -> CacheResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    pub fn get_item(&self, key: &str) -> CacheResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    /// Removes `key`; returns whether an entry existed.
    pub fn remove_item(&self, key: &str) -> CacheResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM local_storage WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }

    /// Epoch milliseconds of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> CacheResult<Option<i64>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT updated_at FROM local_storage WHERE key = ?1;",
                [key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Lists stored keys in ascending order.
    pub fn keys(&self) -> CacheResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM local_storage ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get_item(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let text = serde_json::to_string(value)?;
        self.set_item(key, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::LocalCache;
    use serde_json::{json, Value};

    #[test]
    fn set_get_and_overwrite() {
        let cache = LocalCache::open_in_memory().unwrap();
        assert_eq!(cache.get_item("tasks").unwrap(), None);

        cache.set_item("tasks", "[]").unwrap();
        cache.set_item("tasks", "[1]").unwrap();
        assert_eq!(cache.get_item("tasks").unwrap().as_deref(), Some("[1]"));
        assert!(cache.updated_at("tasks").unwrap().is_some());
    }

    #[test]
    fn json_helpers_roundtrip_values() {
        let cache = LocalCache::open_in_memory().unwrap();
        cache
            .set_json("contacts", &json!([{"id": "c1", "name": "Ann"}]))
            .unwrap();
        let loaded: Value = cache.get_json("contacts").unwrap().unwrap();
        assert_eq!(loaded[0]["name"], "Ann");
    }

    #[test]
    fn remove_reports_presence() {
        let cache = LocalCache::open_in_memory().unwrap();
        cache.set_item("currentUser", "{}").unwrap();
        assert!(cache.remove_item("currentUser").unwrap());
        assert!(!cache.remove_item("currentUser").unwrap());
        assert!(cache.keys().unwrap().is_empty());
    }
}
