use std::collections::BTreeMap;
use std::sync::RwLock;

use dirsync_types::{Group, User};

use crate::error::StoreResult;
use crate::state::{IdentityState, DEFAULT_MAX_FIELD_LENGTH};
use crate::traits::IdentityStore;

/// In-memory identity store.
///
/// Intended for tests and embedding. Records live behind a `RwLock` and are
/// cloned on read and write.
pub struct InMemoryIdentityStore {
    state: RwLock<IdentityState>,
    max_field_length: usize,
}

impl InMemoryIdentityStore {
    /// Create an empty store with the default field length limit.
    pub fn new() -> Self {
        Self::with_max_field_length(DEFAULT_MAX_FIELD_LENGTH)
    }

    /// Create an empty store rejecting values longer than `max` characters.
    pub fn with_max_field_length(max: usize) -> Self {
        Self {
            state: RwLock::new(IdentityState::default()),
            max_field_length: max,
        }
    }

    /// Number of users.
    pub fn user_count(&self) -> usize {
        self.state.read().expect("lock poisoned").users().len()
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.state.read().expect("lock poisoned").groups().len()
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn get_or_create_group(
        &self,
        name: &str,
        defaults: &BTreeMap<String, String>,
    ) -> StoreResult<(Group, bool)> {
        let mut state = self.state.write().expect("lock poisoned");
        state.get_or_create_group(name, defaults, self.max_field_length)
    }

    fn group(&self, name: &str) -> StoreResult<Option<Group>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state.find_group(name).cloned())
    }

    fn groups(&self) -> StoreResult<Vec<Group>> {
        Ok(self.state.read().expect("lock poisoned").groups())
    }

    fn get_or_create_user(
        &self,
        username: &str,
        defaults: &BTreeMap<String, String>,
    ) -> StoreResult<(User, bool)> {
        let mut state = self.state.write().expect("lock poisoned");
        state.get_or_create_user(username, defaults, self.max_field_length)
    }

    fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        state.save_user(user, self.max_field_length)
    }

    fn user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.state.read().expect("lock poisoned").user(username))
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.state.read().expect("lock poisoned").users())
    }

    fn delete_user(&self, username: &str) -> StoreResult<bool> {
        Ok(self.state.write().expect("lock poisoned").delete_user(username))
    }
}

impl std::fmt::Debug for InMemoryIdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIdentityStore")
            .field("users", &self.user_count())
            .field("groups", &self.group_count())
            .finish()
    }
}
