use std::collections::BTreeSet;
use std::sync::Arc;

use dirsync_store::IdentityStore;
use dirsync_types::User;
use tracing::{debug, error, info};

use crate::error::{EngineResult, HookError};
use crate::hooks::RemovedUserHook;
use crate::report::RemovalReport;

/// Finds local users missing from the directory and hands them to the
/// removal hooks.
///
/// The detector itself never modifies the store; deactivation, deletion or
/// anything else is up to the hooks.
pub struct RemovalDetector<'a> {
    store: &'a dyn IdentityStore,
    hooks: &'a [Arc<dyn RemovedUserHook>],
}

impl<'a> RemovalDetector<'a> {
    pub fn new(store: &'a dyn IdentityStore, hooks: &'a [Arc<dyn RemovedUserHook>]) -> Self {
        Self { store, hooks }
    }

    fn run_hooks(&self, user: &User) -> Result<(), HookError> {
        for hook in self.hooks {
            hook.on_user_removed(user, self.store)?;
            debug!(hook = hook.name(), user = %user.username, "called removal callback");
        }
        Ok(())
    }

    /// Run the removal hooks for every local username not in `confirmed`.
    ///
    /// Confirmed names are lower-case; local names are compared ignoring
    /// case. Names are processed in sorted order. A failing hook stops the
    /// chain for that user only.
    pub fn detect(&self, confirmed: &BTreeSet<String>) -> EngineResult<RemovalReport> {
        let local = self.store.usernames()?;
        let mut report = RemovalReport::default();

        let missing = local
            .iter()
            .filter(|name| !confirmed.contains(&name.to_lowercase()));
        for username in missing {
            let Some(user) = self.store.user(username)? else {
                debug!(user = %username, "user vanished before removal callbacks ran");
                continue;
            };
            report.removed.push(username.clone());
            if let Err(e) = self.run_hooks(&user) {
                error!(user = %username, error = %e, "removal callback failed");
                report.hook_failures.push(username.clone());
            }
        }

        info!(
            removed = report.removed.len(),
            failed = report.hook_failures.len(),
            "removed users are processed"
        );
        Ok(report)
    }
}
