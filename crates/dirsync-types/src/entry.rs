use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute values of a directory entry, kept as raw bytes.
///
/// Attribute names are matched exactly first and then ASCII
/// case-insensitively, since directory attribute descriptions are
/// case-insensitive but servers echo whatever casing they store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAttributes(BTreeMap<String, Vec<Vec<u8>>>);

impl RawAttributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a multi-valued attribute.
    pub fn with(mut self, name: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        self.insert(name, values);
        self
    }

    /// Builder-style insert of a single UTF-8 value.
    pub fn with_text(self, name: impl Into<String>, value: &str) -> Self {
        self.with(name, vec![value.as_bytes().to_vec()])
    }

    /// Insert or replace the values of an attribute.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Vec<u8>>) {
        self.0.insert(name.into(), values);
    }

    /// All values of an attribute, if present.
    pub fn get(&self, name: &str) -> Option<&[Vec<u8>]> {
        if let Some(values) = self.0.get(name) {
            return Some(values);
        }
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// The first value of an attribute, if present and non-empty.
    pub fn first(&self, name: &str) -> Option<&[u8]> {
        self.get(name)
            .and_then(|values| values.first())
            .map(Vec::as_slice)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over attribute names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<u8>])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, Vec<Vec<u8>>)> for RawAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Vec<u8>>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single result produced by a directory search.
///
/// Directories can return results that are not entries at all (search
/// references, referrals). Those arrive as [`DirectoryEntry::Malformed`] and
/// are skipped by every consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryEntry {
    /// A regular entry with its attributes.
    Valid {
        /// Distinguished name of the entry.
        dn: String,
        /// Requested attributes returned for the entry.
        attributes: RawAttributes,
    },
    /// A result without a usable attribute set.
    Malformed {
        /// Identifier, when the directory supplied one.
        dn: Option<String>,
    },
}

impl DirectoryEntry {
    /// Construct a valid entry.
    pub fn valid(dn: impl Into<String>, attributes: RawAttributes) -> Self {
        Self::Valid {
            dn: dn.into(),
            attributes,
        }
    }

    /// Construct a malformed entry.
    pub fn malformed(dn: Option<String>) -> Self {
        Self::Malformed { dn }
    }

    /// The entry identifier, if any.
    pub fn dn(&self) -> Option<&str> {
        match self {
            Self::Valid { dn, .. } => Some(dn),
            Self::Malformed { dn } => dn.as_deref(),
        }
    }

    /// Returns `true` for [`DirectoryEntry::Malformed`].
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_returns_first_value() {
        let attrs = RawAttributes::new().with("mail", vec![b"a@x".to_vec(), b"b@x".to_vec()]);
        assert_eq!(attrs.first("mail"), Some(&b"a@x"[..]));
    }

    #[test]
    fn first_of_empty_value_list_is_none() {
        let attrs = RawAttributes::new().with("mail", vec![]);
        assert!(attrs.get("mail").is_some());
        assert!(attrs.first("mail").is_none());
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let attrs = RawAttributes::new().with_text("userAccountControl", "512");
        assert_eq!(attrs.first("useraccountcontrol"), Some(&b"512"[..]));
        assert!(attrs.first("missing").is_none());
    }

    #[test]
    fn exact_match_wins_over_case_fold() {
        let attrs = RawAttributes::new()
            .with_text("CN", "upper")
            .with_text("cn", "lower");
        assert_eq!(attrs.first("cn"), Some(&b"lower"[..]));
        assert_eq!(attrs.first("CN"), Some(&b"upper"[..]));
    }

    #[test]
    fn entry_accessors() {
        let valid = DirectoryEntry::valid("cn=a", RawAttributes::new());
        assert_eq!(valid.dn(), Some("cn=a"));
        assert!(!valid.is_malformed());

        let bad = DirectoryEntry::malformed(None);
        assert!(bad.dn().is_none());
        assert!(bad.is_malformed());
    }

    #[test]
    fn entry_serde_roundtrip() {
        let entry = DirectoryEntry::valid("cn=a", RawAttributes::new().with_text("cn", "a"));
        let json = serde_json::to_string(&entry).unwrap();
        let back: DirectoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
