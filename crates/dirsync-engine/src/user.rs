use dirsync_directory::DirectoryResult;
use dirsync_store::IdentityStore;
use dirsync_types::{DirectoryEntry, RawAttributes, User};
use tracing::{debug, error, info, warn};

use crate::error::{EngineResult, HookError};
use crate::mapper::AttributeMapper;
use crate::report::UserSyncReport;
use crate::settings::UserSettings;

/// Creates and updates local users from directory users.
///
/// For each entry the user is fetched or created, drifted fields are
/// overwritten, the user-sync hooks run, and the result is saved. Every
/// username that made it into the store is recorded as confirmed, whether or
/// not the final save succeeded, so a user that keeps failing to save is
/// never treated as removed.
pub struct UserReconciler<'a> {
    store: &'a dyn IdentityStore,
    settings: &'a UserSettings,
}

impl<'a> UserReconciler<'a> {
    pub fn new(store: &'a dyn IdentityStore, settings: &'a UserSettings) -> Self {
        Self { store, settings }
    }

    fn run_hooks(
        &self,
        user: &mut User,
        attributes: &RawAttributes,
        created: bool,
        updated: bool,
    ) -> Result<(), HookError> {
        for hook in &self.settings.callbacks {
            hook.on_user_synced(user, attributes, created, updated)?;
            debug!(hook = hook.name(), user = %user.username, "called user callback");
        }
        Ok(())
    }

    /// Process every entry of a user search.
    pub fn reconcile<I>(&self, entries: I) -> EngineResult<UserSyncReport>
    where
        I: IntoIterator<Item = DirectoryResult<DirectoryEntry>>,
    {
        let mapper = AttributeMapper::new(&self.settings.attributes);
        let username_field = self.settings.username_field.as_str();
        let mut report = UserSyncReport::default();

        for entry in entries {
            let (dn, attributes) = match entry? {
                DirectoryEntry::Valid { dn, attributes } => (dn, attributes),
                DirectoryEntry::Malformed { .. } => {
                    report.skipped += 1;
                    continue;
                }
            };

            let mut record = mapper.map(&attributes);
            for attribute in record.undecodable() {
                warn!(%dn, attribute = %attribute, "attribute is not valid UTF-8; using empty value");
            }
            let username = record.get(username_field).unwrap_or_default().to_lowercase();
            record.set(username_field, username.clone());

            let (mut user, created) = match self.store.get_or_create_user(&username, &record.to_map()) {
                Ok(found) => found,
                Err(e) if e.is_conflict() => {
                    error!(user = %username, error = %e, "error creating user");
                    report.failed.push(username);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut updated = false;
            if created {
                user.set_unusable_password();
                debug!(user = %username, "created user");
            } else {
                if user.username != username {
                    debug!(from = %user.username, to = %username, "normalizing stored username");
                    user.username = username.clone();
                    updated = true;
                }
                for (field, value) in record.iter() {
                    updated |= user.set_field(field, value);
                }
                if updated {
                    debug!(user = %username, "updated user");
                }
            }

            report.confirmed.insert(username.clone());

            if let Err(e) = self.run_hooks(&mut user, &attributes, created, updated) {
                error!(user = %username, error = %e, "user callback failed; user not saved");
                report.hook_failures.push(username);
                continue;
            }

            // Hooks may have introduced a conflict, so save can still fail here.
            match self.store.save_user(&user) {
                Ok(()) => {}
                Err(e) if e.is_conflict() => {
                    error!(user = %username, error = %e, "error updating user");
                    report.failed.push(username);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            match (created, updated) {
                (true, _) => report.created += 1,
                (false, true) => report.updated += 1,
                (false, false) => report.unchanged += 1,
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed.len(),
            "users are synchronized"
        );
        Ok(report)
    }
}
