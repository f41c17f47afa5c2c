//! Foundation types for dirsync.
//!
//! This crate provides the values that flow between the directory, the
//! reconciliation engine and the local identity store. Every other dirsync
//! crate depends on `dirsync-types`.
//!
//! # Key Types
//!
//! - [`DirectoryEntry`] — One search result: a valid entry or a malformed one
//! - [`RawAttributes`] — Attribute name to raw byte values, as the directory returns them
//! - [`AttributeMap`] — Ordered directory-attribute to local-field table
//! - [`MappedRecord`] — Decoded local-field values for a single entry
//! - [`Group`] / [`User`] — Persistent local principals
//! - [`Credential`] — Local password state of a user

pub mod entry;
pub mod mapping;
pub mod principal;

pub use entry::{DirectoryEntry, RawAttributes};
pub use mapping::{AttributeMap, AttributeMapping, MappedRecord};
pub use principal::{Credential, Group, User};
