//! SQLite file behind the local mirror.
//!
//! The schema is a single `local_storage` table, one row per mirror key:
//! `key` is a collection name (`contacts`, `tasks`, `users`) or `currentUser`,
//! `value` the serialized JSON and `updated_at` the last write in epoch
//! milliseconds.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`; a file written by a
//!   newer build is refused rather than downgraded.
//! - [`crate::cache::LocalCache`] only touches a connection returned by
//!   [`open_db`] or [`open_db_in_memory`], so migrations have already run.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Table holding the mirrored entries.
pub const LOCAL_STORAGE_TABLE: &str = "local_storage";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The cache file was migrated by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "local cache database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "cache schema version {db_version} is newer than supported {latest_supported}; \
                 delete the cache file or upgrade"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Schema version recorded in the cache file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

