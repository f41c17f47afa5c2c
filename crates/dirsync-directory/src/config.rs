use serde::{Deserialize, Serialize};

/// Connection settings for an LDAP directory.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapSettings {
    /// Server URI, e.g. `ldap://localhost:389` or `ldaps://ldap.example.com`.
    pub uri: String,
    /// DN to bind as. Anonymous bind when unset.
    #[serde(default)]
    pub bind_dn: Option<String>,
    #[serde(default)]
    pub bind_password: Option<String>,
    /// Search base for both group and user searches.
    pub base_dn: String,
    /// Entries per page of the paged-results control.
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    /// Connect and operation timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub starttls: bool,
    /// Skip certificate verification (test servers only).
    #[serde(default)]
    pub no_tls_verify: bool,
}

fn default_page_size() -> i32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

impl LdapSettings {
    /// Settings for an anonymous connection with defaults.
    pub fn new(uri: impl Into<String>, base_dn: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            bind_dn: None,
            bind_password: None,
            base_dn: base_dn.into(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            starttls: false,
            no_tls_verify: false,
        }
    }
}

impl std::fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSettings")
            .field("uri", &self.uri)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| "<redacted>"))
            .field("base_dn", &self.base_dn)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("starttls", &self.starttls)
            .field("no_tls_verify", &self.no_tls_verify)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied_on_deserialize() {
        let settings: LdapSettings = toml::from_str(
            r#"
            uri = "ldap://localhost"
            base_dn = "dc=example,dc=com"
            "#,
        )
        .unwrap();
        assert_eq!(settings.page_size, 500);
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.bind_dn.is_none());
        assert!(!settings.starttls);
    }

    #[test]
    fn debug_redacts_password() {
        let mut settings = LdapSettings::new("ldap://localhost", "dc=example,dc=com");
        settings.bind_password = Some("hunter2".into());
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
