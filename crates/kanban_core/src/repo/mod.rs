//! Entity repositories over the synchronized store.
//!
//! # Responsibility
//! - Provide list/create/update/delete/find APIs per collection.
//! - Convert stored id-keyed maps into ordered typed vectors.
//!
//! # Invariants
//! - Lists are ordered by `createdAt`, then id.
//! - Persisted records that fail to decode are reported, not skipped.
//! - A write succeeds when it reached the remote store or the local mirror.

use crate::sync::WriteOutcome;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod collection;
pub mod contact_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// A stored record does not match the expected shape.
    InvalidData {
        collection: &'static str,
        message: String,
    },
    /// Neither the remote store nor the local mirror accepted the write.
    WriteFailed {
        collection: &'static str,
        target: String,
        reason: String,
    },
    Serialization(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidData {
                collection,
                message,
            } => write!(f, "invalid persisted {collection} data: {message}"),
            Self::WriteFailed {
                collection,
                target,
                reason,
            } => write!(f, "failed to write {collection} `{target}`: {reason}"),
            Self::Serialization(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

pub(crate) fn ensure_persisted(
    outcome: WriteOutcome,
    collection: &'static str,
    target: &str,
) -> RepoResult<()> {
    if outcome.is_persisted() {
        return Ok(());
    }
    let reason = outcome
        .remote_error()
        .map(ToString::to_string)
        .unwrap_or_else(|| "local mirror write failed".to_string());
    Err(RepoError::WriteFailed {
        collection,
        target: target.to_string(),
        reason,
    })
}
