//! Local identity store for dirsync.
//!
//! The store owns the persistent group and user records that the
//! reconciliation engine keeps in line with the directory. Names are unique
//! case-insensitively; the engine relies on that to map directory entries onto
//! existing records.
//!
//! # Storage Backends
//!
//! All backends implement the [`IdentityStore`] trait:
//!
//! - [`InMemoryIdentityStore`] -- `RwLock`-guarded tables for tests and embedding
//! - [`JsonFileStore`] -- single JSON document, written through on every change
//!
//! # Design Rules
//!
//! 1. Lookups for get-or-create are case-insensitive; exact lookups are exact.
//! 2. Constraint failures are [`StoreError::Integrity`] or
//!    [`StoreError::Validation`] and never partially apply.
//! 3. Ids are allocated from one counter shared by groups and users.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
mod state;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryIdentityStore;
pub use state::DEFAULT_MAX_FIELD_LENGTH;
pub use traits::IdentityStore;
