use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Local password state of a user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "hash", rename_all = "snake_case")]
pub enum Credential {
    /// No password has ever been set.
    #[default]
    Blank,
    /// Local password login is disabled; authentication happens elsewhere.
    Unusable,
    /// A locally verifiable password hash.
    Hashed(String),
}

impl Credential {
    /// Returns `true` if the credential can authenticate a local login.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }
}

/// A local group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Store-assigned identifier.
    pub id: u64,
    /// Group name, unique case-insensitively, stored with directory casing.
    pub name: String,
    /// Mapped field values set at creation.
    pub fields: BTreeMap<String, String>,
}

impl Group {
    pub fn new(id: u64, name: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// A local user principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier.
    pub id: u64,
    /// Lower-cased login name, unique.
    pub username: String,
    /// Whether the account may log in.
    pub is_active: bool,
    pub credential: Credential,
    /// Mapped field values, including the username field.
    pub fields: BTreeMap<String, String>,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_active: true,
            credential: Credential::Blank,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Overwrite a field. Returns `true` if the stored value changed.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        if self.field(name) == Some(value) {
            return false;
        }
        self.fields.insert(name.to_owned(), value.to_owned());
        true
    }

    /// Disable local password login for this user.
    pub fn set_unusable_password(&mut self) {
        self.credential = Credential::Unusable;
    }

    pub fn has_usable_password(&self) -> bool {
        self.credential.is_usable()
    }
}
