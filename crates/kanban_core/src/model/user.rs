//! User account records.

use super::Timestamp;
use serde::{Deserialize, Serialize};

pub const GUEST_USER_ID: &str = "guest";

/// Registered (or guest) account.
///
/// Passwords are kept in plaintext; guest users have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Always lowercase.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub initials: String,
    pub color: String,
    #[serde(default)]
    pub is_guest: bool,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Timestamp>,
}

impl User {
    /// Session-only guest account; never stored in the users collection.
    pub fn guest(now: Timestamp) -> Self {
        Self {
            id: GUEST_USER_ID.to_string(),
            name: "Guest User".to_string(),
            email: "guest@join.com".to_string(),
            password: None,
            initials: "GU".to_string(),
            color: "#FF7A00".to_string(),
            is_guest: true,
            created_at: now,
            last_login: Some(now),
        }
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password.as_deref() == Some(candidate)
    }
}

/// Input for creating a user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Shallow patch applied by `UserRepository::update_user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Timestamp>,
}
