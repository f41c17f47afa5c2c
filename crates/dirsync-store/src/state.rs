use std::collections::BTreeMap;

use dirsync_types::{Group, User};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default upper bound on the length of a stored field value, in characters.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 255;

/// Record tables shared by the store backends.
///
/// Holds the constraint logic; backends add locking and persistence.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct IdentityState {
    #[serde(default)]
    groups: BTreeMap<u64, Group>,
    #[serde(default)]
    users: BTreeMap<u64, User>,
    #[serde(default)]
    next_id: u64,
}

fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn validate_name(kind: &str, name: &str, max_len: usize) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation(format!("{kind} name must not be empty")));
    }
    if name.chars().count() > max_len {
        return Err(StoreError::Validation(format!(
            "{kind} name {name:?} exceeds {max_len} characters"
        )));
    }
    Ok(())
}

fn validate_fields(fields: &BTreeMap<String, String>, max_len: usize) -> StoreResult<()> {
    for (field, value) in fields {
        let len = value.chars().count();
        if len > max_len {
            return Err(StoreError::Validation(format!(
                "value for {field} is {len} characters, limit is {max_len}"
            )));
        }
    }
    Ok(())
}

impl IdentityState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn find_group(&self, name: &str) -> Option<&Group> {
        self.groups.values().find(|g| same_name(&g.name, name))
    }

    pub(crate) fn get_or_create_group(
        &mut self,
        name: &str,
        defaults: &BTreeMap<String, String>,
        max_len: usize,
    ) -> StoreResult<(Group, bool)> {
        if let Some(group) = self.find_group(name) {
            return Ok((group.clone(), false));
        }
        validate_name("group", name, max_len)?;
        validate_fields(defaults, max_len)?;

        let id = self.allocate_id();
        let group = Group::new(id, name, defaults.clone());
        self.groups.insert(id, group.clone());
        Ok((group, true))
    }

    pub(crate) fn groups(&self) -> Vec<Group> {
        self.groups.values().cloned().collect()
    }

    pub(crate) fn get_or_create_user(
        &mut self,
        username: &str,
        defaults: &BTreeMap<String, String>,
        max_len: usize,
    ) -> StoreResult<(User, bool)> {
        if let Some(user) = self.users.values().find(|u| same_name(&u.username, username)) {
            return Ok((user.clone(), false));
        }
        validate_name("user", username, max_len)?;
        validate_fields(defaults, max_len)?;

        let id = self.allocate_id();
        let user = User::new(id, username, defaults.clone());
        self.users.insert(id, user.clone());
        Ok((user, true))
    }

    pub(crate) fn save_user(&mut self, user: &User, max_len: usize) -> StoreResult<()> {
        if !self.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(format!("user id {}", user.id)));
        }
        validate_name("user", &user.username, max_len)?;
        validate_fields(&user.fields, max_len)?;
        if let Some(other) = self
            .users
            .values()
            .find(|u| u.id != user.id && same_name(&u.username, &user.username))
        {
            return Err(StoreError::Integrity(format!(
                "username {} already taken by user id {}",
                user.username, other.id
            )));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    pub(crate) fn user(&self, username: &str) -> Option<User> {
        self.users.values().find(|u| u.username == username).cloned()
    }

    pub(crate) fn users(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    pub(crate) fn delete_user(&mut self, username: &str) -> bool {
        let id = self
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id);
        match id {
            Some(id) => self.users.remove(&id).is_some(),
            None => false,
        }
    }
}
