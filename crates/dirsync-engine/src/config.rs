use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dirsync_directory::LdapSettings;
use dirsync_store::DEFAULT_MAX_FIELD_LENGTH;
use dirsync_types::AttributeMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete on-disk configuration of a sync run.
///
/// Callback names are plain strings here; [`crate::HookRegistry::resolve`]
/// turns them into hook objects and produces the [`crate::SyncSettings`]
/// the engine actually runs with.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Directory connection. Only needed when running against LDAP.
    #[serde(default)]
    pub connection: Option<LdapSettings>,
    #[serde(default)]
    pub groups: Option<GroupConfig>,
    #[serde(default)]
    pub users: Option<UserConfig>,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Group search and mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Search filter. Group sync is skipped when unset or empty.
    #[serde(default)]
    pub filter: Option<String>,
    /// Local field holding the group name.
    #[serde(default = "default_group_name_field")]
    pub name_field: String,
    pub attributes: AttributeMap,
}

/// User search, mapping, and callbacks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Search filter. User sync and removal detection are skipped when unset
    /// or empty.
    #[serde(default)]
    pub filter: Option<String>,
    /// Local field holding the username.
    #[serde(default = "default_username_field")]
    pub username_field: String,
    pub attributes: AttributeMap,
    /// Additional attributes requested for callbacks but not mapped.
    #[serde(default)]
    pub extra_attributes: Vec<String>,
    /// User-sync callbacks, run in order for every reconciled user.
    #[serde(default)]
    pub callbacks: Vec<String>,
    /// Removal callbacks, run in order for every local-only user.
    #[serde(default)]
    pub removed_callbacks: Vec<String>,
}

/// Local store location and limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_field_length")]
    pub max_field_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_field_length: default_max_field_length(),
        }
    }
}

fn default_group_name_field() -> String {
    "name".into()
}

fn default_username_field() -> String {
    "username".into()
}

fn default_max_field_length() -> usize {
    DEFAULT_MAX_FIELD_LENGTH
}

/// Treat an empty filter the same as a missing one.
pub(crate) fn active_filter(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|f| !f.is_empty())
}

fn validate_table(section: &str, name_field: &str, attributes: &AttributeMap) -> Result<(), ConfigError> {
    if attributes.is_empty() {
        return Err(ConfigError::Invalid(format!("[{section}] attributes must not be empty")));
    }
    let mut seen = HashSet::new();
    for field in attributes.fields() {
        if !seen.insert(field) {
            return Err(ConfigError::Invalid(format!(
                "[{section}] field {field} is mapped more than once"
            )));
        }
    }
    if !attributes.maps_field(name_field) {
        return Err(ConfigError::Invalid(format!(
            "[{section}] name field {name_field} is not among the mapped fields"
        )));
    }
    Ok(())
}

impl SyncConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(groups) = &self.groups {
            validate_table("groups", &groups.name_field, &groups.attributes)?;
        }
        if let Some(users) = &self.users {
            validate_table("users", &users.username_field, &users.attributes)?;
        }
        if let Some(connection) = &self.connection {
            if connection.page_size <= 0 {
                return Err(ConfigError::Invalid("[connection] page_size must be positive".into()));
            }
        }
        if self.store.max_field_length == 0 {
            return Err(ConfigError::Invalid("[store] max_field_length must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [connection]
        uri = "ldap://localhost:389"
        bind_dn = "cn=admin,dc=example,dc=com"
        bind_password = "secret"
        base_dn = "dc=example,dc=com"
        page_size = 100

        [groups]
        filter = "(objectClass=groupOfNames)"
        attributes = [{ ldap = "cn", field = "name" }]

        [users]
        filter = "(objectClass=inetOrgPerson)"
        attributes = [
            { ldap = "uid", field = "username" },
            { ldap = "mail", field = "email" },
        ]
        extra_attributes = ["userAccountControl"]
        callbacks = ["active_directory_deactivate"]
        removed_callbacks = ["deactivate"]

        [store]
        path = "identities.json"
    "#;

    #[test]
    fn parses_full_config() {
        let config = SyncConfig::from_toml(FULL).unwrap();
        let groups = config.groups.unwrap();
        assert_eq!(groups.name_field, "name");
        let users = config.users.unwrap();
        assert_eq!(users.username_field, "username");
        assert_eq!(users.attributes.directory_attributes(), vec!["uid", "mail"]);
        assert_eq!(users.removed_callbacks, vec!["deactivate"]);
        assert_eq!(config.connection.unwrap().page_size, 100);
        assert_eq!(config.store.max_field_length, DEFAULT_MAX_FIELD_LENGTH);
    }

    #[test]
    fn empty_config_is_valid() {
        let config = SyncConfig::from_toml("").unwrap();
        assert!(config.groups.is_none());
        assert!(config.users.is_none());
        assert!(config.connection.is_none());
    }

    #[test]
    fn name_field_must_be_mapped() {
        let err = SyncConfig::from_toml(
            r#"
            [users]
            filter = "(uid=*)"
            username_field = "login"
            attributes = [{ ldap = "uid", field = "username" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("login")));
    }

    #[test]
    fn duplicate_target_field_rejected() {
        let err = SyncConfig::from_toml(
            r#"
            [groups]
            attributes = [{ ldap = "cn", field = "name" }, { ldap = "ou", field = "name" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_attribute_table_rejected() {
        let err = SyncConfig::from_toml("[groups]\nattributes = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = SyncConfig::from_toml("[store]\nfile = \"x.json\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn blank_filter_is_inactive() {
        assert_eq!(active_filter(&None), None);
        assert_eq!(active_filter(&Some("   ".into())), None);
        assert_eq!(active_filter(&Some("(uid=*)".into())), Some("(uid=*)"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, FULL).unwrap();
        let config = SyncConfig::load(&path).unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from("identities.json")));
    }
}
