use std::collections::HashMap;

use dirsync_types::DirectoryEntry;

use crate::error::{DirectoryError, DirectoryResult};
use crate::traits::{Directory, EntryStream};

/// A search issued against an [`InMemoryDirectory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedSearch {
    pub filter: String,
    pub attributes: Vec<String>,
}

/// In-memory directory with canned results per filter.
///
/// Intended for tests and offline runs. Filters are matched verbatim; a
/// filter with no canned results yields an empty stream. A stream failure
/// can be injected after a given number of entries to exercise the
/// connection-drop path.
#[derive(Default)]
pub struct InMemoryDirectory {
    results: HashMap<String, Vec<DirectoryEntry>>,
    failures: HashMap<String, usize>,
    searches: Vec<RecordedSearch>,
    unbind_calls: usize,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entries returned for `filter`.
    pub fn with_results(mut self, filter: impl Into<String>, entries: Vec<DirectoryEntry>) -> Self {
        self.results.insert(filter.into(), entries);
        self
    }

    /// Make the stream for `filter` fail after yielding `after` entries.
    pub fn fail_after(mut self, filter: impl Into<String>, after: usize) -> Self {
        self.failures.insert(filter.into(), after);
        self
    }

    /// Searches issued so far, in order.
    pub fn searches(&self) -> &[RecordedSearch] {
        &self.searches
    }

    /// Number of times `unbind` was called.
    pub fn unbind_calls(&self) -> usize {
        self.unbind_calls
    }

    /// Returns `true` once the directory has been released.
    pub fn is_unbound(&self) -> bool {
        self.unbind_calls > 0
    }
}

impl Directory for InMemoryDirectory {
    fn search(&mut self, filter: &str, attributes: &[String]) -> DirectoryResult<EntryStream<'_>> {
        if self.is_unbound() {
            return Err(DirectoryError::Closed);
        }
        self.searches.push(RecordedSearch {
            filter: filter.to_owned(),
            attributes: attributes.to_vec(),
        });

        let entries = self.results.get(filter).cloned().unwrap_or_default();
        let fail_at = self.failures.get(filter).copied();
        let filter = filter.to_owned();

        let stream = entries
            .into_iter()
            .map(Ok)
            .enumerate()
            .map(move |(idx, item)| match fail_at {
                Some(at) if idx >= at => Err(DirectoryError::Search {
                    filter: filter.clone(),
                    reason: "connection dropped".into(),
                }),
                _ => item,
            })
            // A broken stream yields its error once and then ends.
            .scan(false, |broken, item| {
                if *broken {
                    return None;
                }
                *broken = item.is_err();
                Some(item)
            });
        Ok(Box::new(stream))
    }

    fn unbind(&mut self) -> DirectoryResult<()> {
        self.unbind_calls += 1;
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDirectory")
            .field("filters", &self.results.len())
            .field("searches", &self.searches.len())
            .field("unbind_calls", &self.unbind_calls)
            .finish()
    }
}
