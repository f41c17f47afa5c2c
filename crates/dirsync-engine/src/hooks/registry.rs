use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{active_filter, SyncConfig};
use crate::error::ConfigError;
use crate::hooks::builtin::{ActiveDirectoryDeactivate, DeactivateRemoved, DeleteRemoved};
use crate::hooks::{RemovedUserHook, UserSyncHook};
use crate::settings::{GroupSettings, SyncSettings, UserSettings};

/// Named hooks available to configuration files.
pub struct HookRegistry {
    user_hooks: BTreeMap<String, Arc<dyn UserSyncHook>>,
    removed_hooks: BTreeMap<String, Arc<dyn RemovedUserHook>>,
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            user_hooks: BTreeMap::new(),
            removed_hooks: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in hooks.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_user_hook(Arc::new(ActiveDirectoryDeactivate));
        registry.register_removed_hook(Arc::new(DeactivateRemoved));
        registry.register_removed_hook(Arc::new(DeleteRemoved));
        registry
    }

    /// Register a user-sync hook under its own name, replacing any previous
    /// hook of that name.
    pub fn register_user_hook(&mut self, hook: Arc<dyn UserSyncHook>) {
        self.user_hooks.insert(hook.name().to_owned(), hook);
    }

    /// Register a removal hook under its own name.
    pub fn register_removed_hook(&mut self, hook: Arc<dyn RemovedUserHook>) {
        self.removed_hooks.insert(hook.name().to_owned(), hook);
    }

    pub fn user_hook_names(&self) -> impl Iterator<Item = &str> {
        self.user_hooks.keys().map(String::as_str)
    }

    pub fn removed_hook_names(&self) -> impl Iterator<Item = &str> {
        self.removed_hooks.keys().map(String::as_str)
    }

    fn lookup<H: ?Sized>(
        hooks: &BTreeMap<String, Arc<H>>,
        kind: &'static str,
        names: &[String],
    ) -> Result<Vec<Arc<H>>, ConfigError> {
        names
            .iter()
            .map(|name| {
                hooks.get(name).cloned().ok_or_else(|| ConfigError::UnknownHook {
                    kind,
                    name: name.clone(),
                })
            })
            .collect()
    }

    /// Validate `config` and resolve every callback name it references.
    ///
    /// Callback names are checked even for phases whose filter is unset, so
    /// a typo is reported before it matters.
    pub fn resolve(&self, config: &SyncConfig) -> Result<SyncSettings, ConfigError> {
        config.validate()?;

        let groups = config.groups.as_ref().and_then(|groups| {
            active_filter(&groups.filter).map(|filter| GroupSettings {
                filter: filter.to_owned(),
                name_field: groups.name_field.clone(),
                attributes: groups.attributes.clone(),
            })
        });

        let users = match &config.users {
            Some(users) => {
                let callbacks = Self::lookup(&self.user_hooks, "user", &users.callbacks)?;
                let removed_callbacks =
                    Self::lookup(&self.removed_hooks, "removed-user", &users.removed_callbacks)?;
                active_filter(&users.filter).map(|filter| UserSettings {
                    filter: filter.to_owned(),
                    username_field: users.username_field.clone(),
                    attributes: users.attributes.clone(),
                    extra_attributes: users.extra_attributes.clone(),
                    callbacks,
                    removed_callbacks,
                })
            }
            None => None,
        };

        Ok(SyncSettings { groups, users })
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("user_hooks", &self.user_hooks.keys().collect::<Vec<_>>())
            .field("removed_hooks", &self.removed_hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
