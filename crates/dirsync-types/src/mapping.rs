use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of an attribute table: a directory attribute and the local field
/// it populates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapping {
    /// Directory attribute name (e.g. `uid`, `mail`).
    pub ldap: String,
    /// Local field name (e.g. `username`, `email`).
    pub field: String,
}

impl AttributeMapping {
    pub fn new(ldap: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            ldap: ldap.into(),
            field: field.into(),
        }
    }
}

/// Ordered attribute table.
///
/// The order is the order attributes are requested from the directory and
/// the order fields appear in a [`MappedRecord`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(Vec<AttributeMapping>);

impl AttributeMap {
    pub fn new(mappings: Vec<AttributeMapping>) -> Self {
        Self(mappings)
    }

    /// Build from `(ldap, field)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(ldap, field)| AttributeMapping::new(ldap, field))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeMapping> {
        self.0.iter()
    }

    /// Directory attribute names, in table order.
    pub fn directory_attributes(&self) -> Vec<String> {
        self.0.iter().map(|m| m.ldap.clone()).collect()
    }

    /// Local field names, in table order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|m| m.field.as_str())
    }

    /// Returns `true` if some row targets `field`.
    pub fn maps_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decoded field values for one directory entry.
///
/// Holds exactly one value per configured field, in table order. Fields whose
/// attribute was absent or undecodable carry an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappedRecord {
    fields: Vec<(String, String)>,
    undecodable: Vec<String>,
}

impl MappedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value for the same field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Record that a directory attribute could not be decoded as UTF-8.
    pub fn mark_undecodable(&mut self, attribute: impl Into<String>) {
        self.undecodable.push(attribute.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    /// Field values keyed by field name, as store defaults.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.fields.iter().cloned().collect()
    }

    /// Attributes whose first value was not valid UTF-8.
    pub fn undecodable(&self) -> &[String] {
        &self.undecodable
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
