use dirsync_store::IdentityStore;
use dirsync_types::{RawAttributes, User};
use tracing::debug;

use crate::error::HookResult;
use crate::hooks::{RemovedUserHook, UserSyncHook};

/// `userAccountControl` flag marking a disabled Active Directory account.
const ACCOUNTDISABLE: u32 = 0x2;

/// Deactivates users whose Active Directory account is disabled.
///
/// Reads `userAccountControl`, so that attribute has to be requested via
/// `extra_attributes`. A missing or non-numeric value leaves the user alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActiveDirectoryDeactivate;

impl ActiveDirectoryDeactivate {
    pub const NAME: &'static str = "active_directory_deactivate";
}

impl UserSyncHook for ActiveDirectoryDeactivate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_user_synced(
        &self,
        user: &mut User,
        attributes: &RawAttributes,
        _created: bool,
        _updated: bool,
    ) -> HookResult<()> {
        let flags = attributes
            .first("userAccountControl")
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(|text| text.trim().parse::<u32>().ok());
        if let Some(flags) = flags {
            if flags & ACCOUNTDISABLE != 0 && user.is_active {
                user.is_active = false;
                debug!(user = %user.username, "account disabled in directory");
            }
        }
        Ok(())
    }
}

/// Marks removed users inactive.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeactivateRemoved;

impl DeactivateRemoved {
    pub const NAME: &'static str = "deactivate";
}

impl RemovedUserHook for DeactivateRemoved {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_user_removed(&self, user: &User, store: &dyn IdentityStore) -> HookResult<()> {
        if user.is_active {
            let mut user = user.clone();
            user.is_active = false;
            store.save_user(&user)?;
            debug!(user = %user.username, "deactivated removed user");
        }
        Ok(())
    }
}

/// Deletes removed users.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteRemoved;

impl DeleteRemoved {
    pub const NAME: &'static str = "delete";
}

impl RemovedUserHook for DeleteRemoved {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_user_removed(&self, user: &User, store: &dyn IdentityStore) -> HookResult<()> {
        if store.delete_user(&user.username)? {
            debug!(user = %user.username, "deleted removed user");
        }
        Ok(())
    }
}
