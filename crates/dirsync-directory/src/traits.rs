use dirsync_types::DirectoryEntry;

use crate::error::DirectoryResult;

/// Lazily produced search results.
///
/// Items are yielded as the backend receives them; an `Err` item means the
/// stream broke and no further entries follow.
pub type EntryStream<'a> = Box<dyn Iterator<Item = DirectoryResult<DirectoryEntry>> + 'a>;

/// Read-only access to an authoritative directory.
///
/// A `Directory` is a scoped resource: it is acquired once, searched any
/// number of times, and released with [`Directory::unbind`]. Implementations
/// must make a second `unbind` a no-op and reject searches after it.
pub trait Directory {
    /// Search with `filter`, returning `attributes` for each entry.
    fn search(&mut self, filter: &str, attributes: &[String]) -> DirectoryResult<EntryStream<'_>>;

    /// Release the connection.
    fn unbind(&mut self) -> DirectoryResult<()>;
}
