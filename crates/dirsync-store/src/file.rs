use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use dirsync_types::{Group, User};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::state::{IdentityState, DEFAULT_MAX_FIELD_LENGTH};
use crate::traits::IdentityStore;

/// Identity store persisted as a single JSON document.
///
/// The document is read once on open. Every successful mutation rewrites it
/// through a temporary file in the same directory followed by an atomic
/// rename, so a crash never leaves a half-written store behind.
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<IdentityState>,
    max_field_length: usize,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_max_field_length(path, DEFAULT_MAX_FIELD_LENGTH)
    }

    /// Open the store with an explicit field length limit.
    pub fn open_with_max_field_length(path: impl AsRef<Path>, max: usize) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IdentityState::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "opened identity store");
        Ok(Self {
            path,
            state: RwLock::new(state),
            max_field_length: max,
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &IdentityState) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Apply `change` to a copy of the state. The copy replaces the live
    /// state only once it is on disk; `change` reports whether it wrote.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut IdentityState) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let mut state = self.state.write().expect("lock poisoned");
        let mut next = state.clone();
        let (value, dirty) = change(&mut next)?;
        if dirty {
            self.persist(&next)?;
            *state = next;
        }
        Ok(value)
    }
}

impl IdentityStore for JsonFileStore {
    fn get_or_create_group(
        &self,
        name: &str,
        defaults: &BTreeMap<String, String>,
    ) -> StoreResult<(Group, bool)> {
        self.mutate(|state| {
            let (group, created) = state.get_or_create_group(name, defaults, self.max_field_length)?;
            Ok(((group, created), created))
        })
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
        self.mutate(|state| {
            let (user, created) = state.get_or_create_user(username, defaults, self.max_field_length)?;
            Ok(((user, created), created))
        })
    }

    fn save_user(&self, user: &User) -> StoreResult<()> {
        self.mutate(|state| {
            state.save_user(user, self.max_field_length)?;
            Ok(((), true))
        })
    }

    fn user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.state.read().expect("lock poisoned").user(username))
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.state.read().expect("lock poisoned").users())
    }

    fn delete_user(&self, username: &str) -> StoreResult<bool> {
        self.mutate(|state| {
            let deleted = state.delete_user(username);
            Ok((deleted, deleted))
        })
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_types::Credential;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json")).unwrap();
        assert!(store.users().unwrap().is_empty());
        assert!(store.groups().unwrap().is_empty());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.get_or_create_group("Admins", &BTreeMap::new()).unwrap();
            let (mut user, _) = store.get_or_create_user("jdoe", &BTreeMap::new()).unwrap();
            user.set_unusable_password();
            store.save_user(&user).unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.group("admins").unwrap().is_some());
        let user = store.user("jdoe").unwrap().unwrap();
        assert_eq!(user.credential, Credential::Unusable);
    }

    #[test]
    fn ids_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let first = {
            let store = JsonFileStore::open(&path).unwrap();
            store.get_or_create_user("a", &BTreeMap::new()).unwrap().0.id
        };
        let store = JsonFileStore::open(&path).unwrap();
        let second = store.get_or_create_user("b", &BTreeMap::new()).unwrap().0.id;
        assert!(second > first);
    }

    #[test]
    fn delete_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.get_or_create_user("gone", &BTreeMap::new()).unwrap();
        assert!(store.delete_user("gone").unwrap());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.user("gone").unwrap().is_none());
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let store = JsonFileStore::open(sub.join("store.json")).unwrap();
        store.get_or_create_user("kept", &BTreeMap::new()).unwrap();
        fs::remove_dir_all(&sub).unwrap();

        let err = store.get_or_create_user("lost", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.user("lost").unwrap().is_none());
        assert!(store.delete_user("kept").is_err());
        assert!(store.user("kept").unwrap().is_some());
    }

    #[test]
    fn corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"not json").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn failed_validation_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get_or_create_user("", &BTreeMap::new()).is_err());
        assert!(!path.exists());
    }
}
