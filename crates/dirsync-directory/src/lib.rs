//! Directory access for dirsync.
//!
//! The reconciliation engine never talks to a directory server directly. It
//! goes through the [`Directory`] trait, which exposes exactly two
//! operations: a lazy filtered search and an unbind.
//!
//! # Backends
//!
//! - [`LdapDirectory`] -- LDAP server via `ldap3`, paged subtree searches
//! - [`InMemoryDirectory`] -- canned results for tests and offline runs
//!
//! # Entry Shape
//!
//! Every search result is a [`dirsync_types::DirectoryEntry`]. Results that
//! are not real entries (referrals, intermediate responses) are surfaced as
//! `Malformed` rather than dropped, so consumers decide how to skip them.

pub mod config;
pub mod error;
pub mod ldap;
pub mod memory;
pub mod traits;

pub use config::LdapSettings;
pub use error::{DirectoryError, DirectoryResult};
pub use ldap::LdapDirectory;
pub use memory::{InMemoryDirectory, RecordedSearch};
pub use traits::{Directory, EntryStream};
