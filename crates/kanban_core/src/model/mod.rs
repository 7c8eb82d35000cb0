//! Board domain model.
//!
//! # Responsibility
//! - Define the records stored in the `users`, `contacts` and `tasks`
//!   collections, plus the inputs used to create and patch them.
//!
//! # Invariants
//! - Every stored record carries a string `id` equal to its collection key.
//! - Field names are camelCase on the wire; timestamps are RFC 3339 UTC.

use chrono::{DateTime, Utc};

pub mod contact;
pub mod profile;
pub mod task;
pub mod user;

/// Wall-clock timestamp stored on records.
pub type Timestamp = DateTime<Utc>;
