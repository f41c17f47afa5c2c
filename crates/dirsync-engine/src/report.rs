use std::collections::BTreeSet;

use serde::Serialize;

/// Outcome of the group phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupSyncReport {
    pub created: usize,
    /// Groups that already existed locally and were left untouched.
    pub existing: usize,
    /// Malformed directory results.
    pub skipped: usize,
    /// Group names rejected by the store.
    pub failed: Vec<String>,
}

/// Outcome of the user phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserSyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Malformed directory results.
    pub skipped: usize,
    /// Usernames rejected by the store on create or save.
    pub failed: Vec<String>,
    /// Usernames whose user-sync hook chain failed.
    pub hook_failures: Vec<String>,
    /// Usernames seen in this directory sweep.
    pub confirmed: BTreeSet<String>,
}

/// Outcome of removal detection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    /// Local-only usernames the removal hooks ran for.
    pub removed: Vec<String>,
    /// Usernames whose removal hook chain failed.
    pub hook_failures: Vec<String>,
}

/// Outcome of a whole run. A phase that did not run is `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub groups: Option<GroupSyncReport>,
    pub users: Option<UserSyncReport>,
    pub removal: Option<RemovalReport>,
}

impl SyncReport {
    /// Returns `true` if any principal failed to sync or any hook failed.
    pub fn has_failures(&self) -> bool {
        self.groups.as_ref().is_some_and(|g| !g.failed.is_empty())
            || self
                .users
                .as_ref()
                .is_some_and(|u| !u.failed.is_empty() || !u.hook_failures.is_empty())
            || self.removal.as_ref().is_some_and(|r| !r.hook_failures.is_empty())
    }
}
