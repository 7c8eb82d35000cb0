//! Current-user session kept in local storage.

use crate::cache::CacheResult;
use crate::model::user::User;
use crate::sync::SyncStore;
use log::warn;
use std::sync::Arc;

/// Local storage key holding the signed-in user.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Handle to the persisted session entry.
#[derive(Clone)]
pub struct Session {
    store: Arc<SyncStore>,
}

impl Session {
    pub fn new(store: Arc<SyncStore>) -> Self {
        Self { store }
    }

    /// Signed-in user, if any. An unreadable entry counts as signed out.
    pub fn current_user(&self) -> Option<User> {
        match self.store.cache().get_json::<User>(CURRENT_USER_KEY) {
            Ok(user) => user,
            Err(err) => {
                warn!("event=session_read module=session status=error error={err}");
                None
            }
        }
    }

    pub fn set_current_user(&self, user: &User) -> CacheResult<()> {
        self.store.cache().set_json(CURRENT_USER_KEY, user)
    }

    /// Clears the session; returns whether one existed.
    pub fn clear(&self) -> CacheResult<bool> {
        self.store.cache().remove_item(CURRENT_USER_KEY)
    }

    /// Id recorded as `createdBy` on new records.
    pub fn actor_id(&self) -> String {
        self.current_user()
            .map(|user| user.id)
            .unwrap_or_else(|| crate::model::user::GUEST_USER_ID.to_string())
    }
}
