use dirsync_directory::Directory;
use dirsync_store::IdentityStore;
use tracing::{info, warn};

use crate::error::EngineResult;
use crate::group::GroupReconciler;
use crate::removal::RemovalDetector;
use crate::report::SyncReport;
use crate::settings::SyncSettings;
use crate::user::UserReconciler;

/// Runs a full reconciliation: groups, then users, then removal detection.
///
/// Each phase runs only when configured. The directory is released when the
/// run ends, whether it succeeded or not.
pub struct SyncOrchestrator<'a> {
    settings: &'a SyncSettings,
    store: &'a dyn IdentityStore,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(settings: &'a SyncSettings, store: &'a dyn IdentityStore) -> Self {
        Self { settings, store }
    }

    /// Run every configured phase against `directory`, then unbind it.
    ///
    /// A phase error is returned after the unbind. An unbind failure is only
    /// logged: by then the store already reflects the run.
    pub fn run(&self, directory: &mut dyn Directory) -> EngineResult<SyncReport> {
        let outcome = self.run_phases(directory);
        if let Err(e) = directory.unbind() {
            warn!(error = %e, "failed to release directory connection");
        }
        outcome
    }

    fn run_phases(&self, directory: &mut dyn Directory) -> EngineResult<SyncReport> {
        let mut report = SyncReport::default();

        if let Some(groups) = &self.settings.groups {
            let attributes = groups.attributes.directory_attributes();
            let entries = directory.search(&groups.filter, &attributes)?;
            report.groups = Some(GroupReconciler::new(self.store, groups).reconcile(entries)?);
        }

        if let Some(users) = &self.settings.users {
            let attributes = users.search_attributes();
            let entries = directory.search(&users.filter, &attributes)?;
            let user_report = UserReconciler::new(self.store, users).reconcile(entries)?;

            if users.removal_enabled() {
                let detector = RemovalDetector::new(self.store, &users.removed_callbacks);
                report.removal = Some(detector.detect(&user_report.confirmed)?);
            }
            report.users = Some(user_report);
        }

        info!("synchronization complete");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use dirsync_directory::{DirectoryError, DirectoryResult, EntryStream, InMemoryDirectory};
    use dirsync_store::InMemoryIdentityStore;
    use dirsync_types::{AttributeMap, Credential, DirectoryEntry, RawAttributes, User};

    use super::*;
    use crate::error::{EngineError, HookResult};
    use crate::hooks::{DeleteRemoved, RemovedUserHook};
    use crate::settings::{GroupSettings, UserSettings};

    const GROUPS: &str = "(objectClass=groupOfNames)";
    const USERS: &str = "(objectClass=inetOrgPerson)";

    #[derive(Default)]
    struct Removed(Mutex<Vec<String>>);

    impl RemovedUserHook for Removed {
        fn name(&self) -> &str {
            "removed"
        }

        fn on_user_removed(&self, user: &User, _store: &dyn IdentityStore) -> HookResult<()> {
            self.0.lock().unwrap().push(user.username.clone());
            Ok(())
        }
    }

    fn group_settings() -> GroupSettings {
        GroupSettings {
            filter: GROUPS.into(),
            name_field: "name".into(),
            attributes: AttributeMap::from_pairs([("cn", "name")]),
        }
    }

    fn user_settings(removed: Vec<Arc<dyn RemovedUserHook>>) -> UserSettings {
        UserSettings {
            filter: USERS.into(),
            username_field: "username".into(),
            attributes: AttributeMap::from_pairs([("uid", "username"), ("mail", "email")]),
            extra_attributes: vec!["userAccountControl".into()],
            callbacks: Vec::new(),
            removed_callbacks: removed,
        }
    }

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_results(
                GROUPS,
                vec![DirectoryEntry::valid(
                    "Admins",
                    RawAttributes::new().with("cn", vec![b"Admins".to_vec()]),
                )],
            )
            .with_results(
                USERS,
                vec![DirectoryEntry::valid(
                    "jdoe",
                    RawAttributes::new()
                        .with("uid", vec![b"jdoe".to_vec()])
                        .with("mail", vec![b"jdoe@example.com".to_vec()]),
                )],
            )
    }

    #[test]
    fn end_to_end_sync() {
        let settings = SyncSettings {
            groups: Some(group_settings()),
            users: Some(user_settings(Vec::new())),
        };
        let store = InMemoryIdentityStore::new();
        let mut dir = directory();

        let report = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();

        assert_eq!(report.groups.unwrap().created, 1);
        assert_eq!(report.users.unwrap().created, 1);
        assert!(report.removal.is_none());

        assert_eq!(store.group("Admins").unwrap().unwrap().name, "Admins");
        let jdoe = store.user("jdoe").unwrap().unwrap();
        assert_eq!(jdoe.field("email"), Some("jdoe@example.com"));
        assert_eq!(jdoe.credential, Credential::Unusable);
        assert_eq!(dir.unbind_calls(), 1);
    }

    #[test]
    fn requests_mapped_then_extra_attributes() {
        let settings = SyncSettings {
            groups: Some(group_settings()),
            users: Some(user_settings(Vec::new())),
        };
        let store = InMemoryIdentityStore::new();
        let mut dir = directory();
        SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();

        let searches = dir.searches();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].filter, GROUPS);
        assert_eq!(searches[0].attributes, vec!["cn"]);
        assert_eq!(searches[1].filter, USERS);
        assert_eq!(searches[1].attributes, vec!["uid", "mail", "userAccountControl"]);
    }

    #[test]
    fn unconfigured_phases_do_not_search() {
        let settings = SyncSettings::default();
        let store = InMemoryIdentityStore::new();
        let mut dir = directory();
        let report = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();
        assert!(dir.searches().is_empty());
        assert!(report.groups.is_none() && report.users.is_none());
        assert!(dir.is_unbound());
    }

    #[test]
    fn removal_runs_for_local_only_users() {
        let store = InMemoryIdentityStore::new();
        for name in ["jdoe", "olduser"] {
            store.get_or_create_user(name, &Default::default()).unwrap();
        }
        let removed = Arc::new(Removed::default());
        let settings = SyncSettings {
            groups: None,
            users: Some(user_settings(vec![removed.clone()])),
        };
        let mut dir = directory();
        let report = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();

        assert_eq!(report.removal.unwrap().removed, vec!["olduser"]);
        assert_eq!(*removed.0.lock().unwrap(), vec!["olduser"]);
    }

    #[test]
    fn mixed_case_local_user_is_not_removed() {
        let store = InMemoryIdentityStore::new();
        store.get_or_create_user("JDoe", &Default::default()).unwrap();
        let removed = Arc::new(Removed::default());
        let settings = SyncSettings {
            groups: None,
            users: Some(user_settings(vec![removed.clone(), Arc::new(DeleteRemoved)])),
        };
        let mut dir = directory();
        let report = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();

        assert!(report.removal.unwrap().removed.is_empty());
        assert!(removed.0.lock().unwrap().is_empty());
        let users = report.users.unwrap();
        assert_eq!(users.updated, 1);
        assert_eq!(store.usernames().unwrap().into_iter().collect::<Vec<_>>(), vec!["jdoe"]);
    }

    #[test]
    fn malformed_user_entry_does_not_break_removal() {
        let store = InMemoryIdentityStore::new();
        store.get_or_create_user("ref", &Default::default()).unwrap();
        let removed = Arc::new(Removed::default());
        let settings = SyncSettings {
            groups: None,
            users: Some(user_settings(vec![removed.clone()])),
        };
        let mut dir = InMemoryDirectory::new()
            .with_results(USERS, vec![DirectoryEntry::malformed(Some("ref".into()))]);

        let report = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();
        assert_eq!(report.users.unwrap().skipped, 1);
        assert_eq!(*removed.0.lock().unwrap(), vec!["ref"]);
    }

    #[test]
    fn unbinds_when_a_phase_fails() {
        let settings = SyncSettings {
            groups: Some(group_settings()),
            users: Some(user_settings(Vec::new())),
        };
        let store = InMemoryIdentityStore::new();
        let mut dir = directory().fail_after(GROUPS, 0);

        let err = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap_err();
        assert!(matches!(err, EngineError::Directory(DirectoryError::Search { .. })));
        assert_eq!(dir.unbind_calls(), 1);
        // The user phase never started.
        assert_eq!(dir.searches().len(), 1);
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn unbind_failure_is_not_fatal() {
        struct FlakyUnbind(InMemoryDirectory);
        impl Directory for FlakyUnbind {
            fn search(&mut self, filter: &str, attributes: &[String]) -> DirectoryResult<EntryStream<'_>> {
                self.0.search(filter, attributes)
            }
            fn unbind(&mut self) -> DirectoryResult<()> {
                Err(DirectoryError::Closed)
            }
        }

        let settings = SyncSettings {
            groups: Some(group_settings()),
            users: None,
        };
        let store = InMemoryIdentityStore::new();
        let mut dir = FlakyUnbind(directory());
        let report = SyncOrchestrator::new(&settings, &store).run(&mut dir).unwrap();
        assert_eq!(report.groups.unwrap().created, 1);
    }

    #[test]
    fn second_run_is_idempotent() {
        let settings = SyncSettings {
            groups: Some(group_settings()),
            users: Some(user_settings(Vec::new())),
        };
        let store = InMemoryIdentityStore::new();
        SyncOrchestrator::new(&settings, &store).run(&mut directory()).unwrap();
        let groups = store.groups().unwrap();
        let users = store.users().unwrap();

        let report = SyncOrchestrator::new(&settings, &store).run(&mut directory()).unwrap();
        assert_eq!(report.groups.unwrap().created, 0);
        let user_report = report.users.unwrap();
        assert_eq!(user_report.created, 0);
        assert_eq!(user_report.unchanged, 1);
        assert_eq!(store.groups().unwrap(), groups);
        assert_eq!(store.users().unwrap(), users);
    }
}
