use dirsync_directory::DirectoryResult;
use dirsync_store::IdentityStore;
use dirsync_types::DirectoryEntry;
use tracing::{debug, error, info, warn};

use crate::error::EngineResult;
use crate::mapper::AttributeMapper;
use crate::report::GroupSyncReport;
use crate::settings::GroupSettings;

/// Creates local groups for directory groups.
///
/// Existing groups are matched by case-insensitive name and left as they
/// are: only creation applies mapped values.
pub struct GroupReconciler<'a> {
    store: &'a dyn IdentityStore,
    settings: &'a GroupSettings,
}

impl<'a> GroupReconciler<'a> {
    pub fn new(store: &'a dyn IdentityStore, settings: &'a GroupSettings) -> Self {
        Self { store, settings }
    }

    /// Process every entry of a group search.
    ///
    /// Store constraint failures are logged and skipped. Directory stream
    /// errors and other store failures abort the phase.
    pub fn reconcile<I>(&self, entries: I) -> EngineResult<GroupSyncReport>
    where
        I: IntoIterator<Item = DirectoryResult<DirectoryEntry>>,
    {
        let mapper = AttributeMapper::new(&self.settings.attributes);
        let mut report = GroupSyncReport::default();

        for entry in entries {
            let (dn, attributes) = match entry? {
                DirectoryEntry::Valid { dn, attributes } => (dn, attributes),
                DirectoryEntry::Malformed { .. } => {
                    report.skipped += 1;
                    continue;
                }
            };

            let record = mapper.map(&attributes);
            for attribute in record.undecodable() {
                warn!(%dn, attribute = %attribute, "attribute is not valid UTF-8; using empty value");
            }
            let name = record.get(&self.settings.name_field).unwrap_or_default().to_owned();

            match self.store.get_or_create_group(&name, &record.to_map()) {
                Ok((_, true)) => {
                    debug!(group = %name, "created group");
                    report.created += 1;
                }
                Ok((_, false)) => report.existing += 1,
                Err(e) if e.is_conflict() => {
                    error!(group = %name, error = %e, "error creating group");
                    report.failed.push(name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            created = report.created,
            existing = report.existing,
            failed = report.failed.len(),
            "groups are synchronized"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use dirsync_directory::DirectoryError;
    use dirsync_store::InMemoryIdentityStore;
    use dirsync_types::{AttributeMap, RawAttributes};

    use super::*;
    use crate::error::EngineError;

    fn settings() -> GroupSettings {
        GroupSettings {
            filter: "(objectClass=groupOfNames)".into(),
            name_field: "name".into(),
            attributes: AttributeMap::from_pairs([("cn", "name"), ("description", "description")]),
        }
    }

    fn group(cn: &str) -> DirectoryResult<DirectoryEntry> {
        Ok(DirectoryEntry::valid(
            format!("cn={cn},ou=groups"),
            RawAttributes::new().with_text("cn", cn),
        ))
    }

    #[test]
    fn creates_missing_groups() {
        let store = InMemoryIdentityStore::new();
        let settings = settings();
        let report = GroupReconciler::new(&store, &settings)
            .reconcile(vec![group("Admins"), group("Staff")])
            .unwrap();
        assert_eq!(report.created, 2);
        let admins = store.group("admins").unwrap().unwrap();
        assert_eq!(admins.name, "Admins");
        assert_eq!(admins.field("description"), Some(""));
    }

    #[test]
    fn second_run_creates_nothing_and_changes_nothing() {
        let store = InMemoryIdentityStore::new();
        let settings = settings();
        let reconciler = GroupReconciler::new(&store, &settings);
        reconciler.reconcile(vec![group("Admins")]).unwrap();
        let before = store.groups().unwrap();

        let entry = DirectoryEntry::valid(
            "cn=ADMINS,ou=groups",
            RawAttributes::new()
                .with_text("cn", "ADMINS")
                .with_text("description", "changed"),
        );
        let report = reconciler.reconcile(vec![Ok(entry)]).unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.existing, 1);
        assert_eq!(store.groups().unwrap(), before);
    }

    #[test]
    fn malformed_entries_skipped() {
        let store = InMemoryIdentityStore::new();
        let settings = settings();
        let report = GroupReconciler::new(&store, &settings)
            .reconcile(vec![Ok(DirectoryEntry::malformed(None)), group("Admins")])
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert_eq!(store.group_count(), 1);
    }

    #[test]
    fn store_conflict_is_isolated() {
        let store = InMemoryIdentityStore::new();
        let settings = settings();
        let nameless = Ok(DirectoryEntry::valid("cn=?,ou=groups", RawAttributes::new()));
        let report = GroupReconciler::new(&store, &settings)
            .reconcile(vec![nameless, group("Staff")])
            .unwrap();
        assert_eq!(report.failed, vec![String::new()]);
        assert_eq!(report.created, 1);
    }

    #[test]
    fn directory_error_aborts() {
        let store = InMemoryIdentityStore::new();
        let settings = settings();
        let broken = Err(DirectoryError::Search {
            filter: "(cn=*)".into(),
            reason: "connection reset".into(),
        });
        let err = GroupReconciler::new(&store, &settings)
            .reconcile(vec![group("Admins"), broken, group("Staff")])
            .unwrap_err();
        assert!(matches!(err, EngineError::Directory(_)));
        assert_eq!(store.group_count(), 1);
    }
}
