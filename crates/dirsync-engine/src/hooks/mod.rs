//! Callback chains run around reconciliation decisions.
//!
//! Hooks are plain trait objects. They are looked up by name once, when the
//! configuration is resolved, and the engine only ever sees ordered lists of
//! them.

pub mod builtin;
pub mod registry;

use dirsync_store::IdentityStore;
use dirsync_types::{RawAttributes, User};

use crate::error::HookResult;

pub use builtin::{ActiveDirectoryDeactivate, DeactivateRemoved, DeleteRemoved};
pub use registry::HookRegistry;

/// Runs for every reconciled user, before the user is saved.
///
/// The hook may mutate `user`; the engine saves whatever the chain leaves
/// behind without validating it first.
pub trait UserSyncHook: Send + Sync {
    /// Name the hook is registered and referenced under.
    fn name(&self) -> &str;

    fn on_user_synced(
        &self,
        user: &mut User,
        attributes: &RawAttributes,
        created: bool,
        updated: bool,
    ) -> HookResult<()>;
}

/// Runs once for every local user absent from the latest directory sweep.
///
/// The engine persists nothing on the hook's behalf; a hook that changes the
/// user must write through `store` itself.
pub trait RemovedUserHook: Send + Sync {
    /// Name the hook is registered and referenced under.
    fn name(&self) -> &str;

    fn on_user_removed(&self, user: &User, store: &dyn IdentityStore) -> HookResult<()>;
}
