//! Reconciliation engine for dirsync.
//!
//! Brings a local [`IdentityStore`](dirsync_store::IdentityStore) in line
//! with an authoritative [`Directory`](dirsync_directory::Directory). A run is
//! a batch: it searches, reconciles every result in sequence, and ends.
//!
//! # Phases
//!
//! 1. **Groups** ([`GroupReconciler`]) -- create missing groups by
//!    case-insensitive name. Existing groups are never updated.
//! 2. **Users** ([`UserReconciler`]) -- create or update users, overwrite
//!    drifted fields, run the user-sync hooks, save.
//! 3. **Removal** ([`RemovalDetector`]) -- local users the directory no longer
//!    returns are handed to the removal hooks.
//!
//! [`SyncOrchestrator`] gates each phase on its configuration and releases
//! the directory connection at the end of every run.
//!
//! # Failure Isolation
//!
//! Store constraint failures and hook failures affect only the principal
//! being processed; they are logged and counted in the [`SyncReport`].
//! Directory failures and store I/O failures abort the run.

pub mod config;
pub mod error;
pub mod group;
pub mod hooks;
pub mod mapper;
pub mod orchestrator;
pub mod removal;
pub mod report;
pub mod settings;
pub mod user;

pub use config::{GroupConfig, StoreConfig, SyncConfig, UserConfig};
pub use error::{ConfigError, EngineError, EngineResult, HookError, HookResult};
pub use group::GroupReconciler;
pub use hooks::{HookRegistry, RemovedUserHook, UserSyncHook};
pub use mapper::AttributeMapper;
pub use orchestrator::SyncOrchestrator;
pub use removal::RemovalDetector;
pub use report::{GroupSyncReport, RemovalReport, SyncReport, UserSyncReport};
pub use settings::{GroupSettings, SyncSettings, UserSettings};
pub use user::UserReconciler;
