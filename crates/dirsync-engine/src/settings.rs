use std::sync::Arc;

use dirsync_types::AttributeMap;

use crate::hooks::{RemovedUserHook, UserSyncHook};

/// Resolved group phase settings.
#[derive(Clone, Debug)]
pub struct GroupSettings {
    pub filter: String,
    pub name_field: String,
    pub attributes: AttributeMap,
}

/// Resolved user phase settings, with hooks ready to call.
#[derive(Clone)]
pub struct UserSettings {
    pub filter: String,
    pub username_field: String,
    pub attributes: AttributeMap,
    pub extra_attributes: Vec<String>,
    pub callbacks: Vec<Arc<dyn UserSyncHook>>,
    pub removed_callbacks: Vec<Arc<dyn RemovedUserHook>>,
}

impl UserSettings {
    /// Attributes to request: mapped ones first, then extras, without
    /// duplicates.
    pub fn search_attributes(&self) -> Vec<String> {
        let mut attrs = self.attributes.directory_attributes();
        for extra in &self.extra_attributes {
            if !attrs.iter().any(|a| a.eq_ignore_ascii_case(extra)) {
                attrs.push(extra.clone());
            }
        }
        attrs
    }

    /// Removal detection runs only when there is something to call.
    pub fn removal_enabled(&self) -> bool {
        !self.removed_callbacks.is_empty()
    }
}

impl std::fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |hooks: Vec<&str>| hooks.join(",");
        f.debug_struct("UserSettings")
            .field("filter", &self.filter)
            .field("username_field", &self.username_field)
            .field("attributes", &self.attributes)
            .field("extra_attributes", &self.extra_attributes)
            .field("callbacks", &names(self.callbacks.iter().map(|h| h.name()).collect()))
            .field(
                "removed_callbacks",
                &names(self.removed_callbacks.iter().map(|h| h.name()).collect()),
            )
            .finish()
    }
}

/// Everything a run needs, built once before reconciliation starts.
///
/// A phase is `None` when its filter is not configured.
#[derive(Clone, Debug, Default)]
pub struct SyncSettings {
    pub groups: Option<GroupSettings>,
    pub users: Option<UserSettings>,
}
