use std::collections::{BTreeMap, BTreeSet};

use dirsync_types::{Group, User};

use crate::error::StoreResult;

/// Persistent collection of local groups and users.
///
/// All implementations must satisfy these invariants:
/// - Group names and usernames are unique under case-insensitive comparison.
/// - `get_or_create_*` look up case-insensitively and only create when no
///   record matches; the returned flag is `true` iff a record was created.
/// - Constraint failures surface as [`crate::StoreError::Integrity`] or
///   [`crate::StoreError::Validation`] and leave the store unchanged.
/// - Writes are serialized by the store; callers need no extra locking.
pub trait IdentityStore: Send + Sync {
    /// Find a group by case-insensitive name, or create it with `defaults`.
    fn get_or_create_group(
        &self,
        name: &str,
        defaults: &BTreeMap<String, String>,
    ) -> StoreResult<(Group, bool)>;

    /// Find a group by case-insensitive name.
    fn group(&self, name: &str) -> StoreResult<Option<Group>>;

    /// All groups, ordered by id.
    fn groups(&self) -> StoreResult<Vec<Group>>;

    /// Find a user by case-insensitive username, or create it with `defaults`.
    fn get_or_create_user(
        &self,
        username: &str,
        defaults: &BTreeMap<String, String>,
    ) -> StoreResult<(User, bool)>;

    /// Persist every field of an existing user.
    fn save_user(&self, user: &User) -> StoreResult<()>;

    /// Find a user by exact username.
    fn user(&self, username: &str) -> StoreResult<Option<User>>;

    /// All users, ordered by id.
    fn users(&self) -> StoreResult<Vec<User>>;

    /// The set of all stored usernames.
    fn usernames(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.users()?.into_iter().map(|u| u.username).collect())
    }

    /// Delete a user by exact username. Returns `true` if the user existed.
    fn delete_user(&self, username: &str) -> StoreResult<bool>;
}
