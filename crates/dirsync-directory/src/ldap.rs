use std::collections::BTreeMap;
use std::time::Duration;

use dirsync_types::{DirectoryEntry, RawAttributes};
use ldap3::adapters::PagedResults;
use ldap3::{LdapConn, LdapConnSettings, ResultEntry, Scope, SearchEntry};
use tracing::{debug, warn};

use crate::config::LdapSettings;
use crate::error::{DirectoryError, DirectoryResult};
use crate::traits::{Directory, EntryStream};

/// Directory backed by an LDAP server.
///
/// Searches run over the whole subtree below the configured base DN using
/// the paged-results control, so large result sets are fetched page by page
/// while the caller iterates.
pub struct LdapDirectory {
    conn: Option<LdapConn>,
    base_dn: String,
    page_size: i32,
}

impl LdapDirectory {
    /// Connect and bind according to `settings`.
    pub fn connect(settings: &LdapSettings) -> DirectoryResult<Self> {
        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(settings.timeout_secs))
            .set_starttls(settings.starttls)
            .set_no_tls_verify(settings.no_tls_verify);

        let mut conn = LdapConn::with_settings(conn_settings, &settings.uri).map_err(|e| {
            DirectoryError::Connection {
                uri: settings.uri.clone(),
                reason: e.to_string(),
            }
        })?;

        if let Some(dn) = &settings.bind_dn {
            let password = settings.bind_password.as_deref().unwrap_or("");
            conn.simple_bind(dn, password)
                .and_then(|res| res.success())
                .map_err(|e| DirectoryError::Bind {
                    dn: dn.clone(),
                    reason: e.to_string(),
                })?;
            debug!(bind_dn = %dn, "bound to directory");
        }

        Ok(Self {
            conn: Some(conn),
            base_dn: settings.base_dn.clone(),
            page_size: settings.page_size,
        })
    }
}

/// Convert a raw search result into a [`DirectoryEntry`].
///
/// Referrals and intermediate messages carry no attribute set and become
/// [`DirectoryEntry::Malformed`].
fn convert(entry: ResultEntry) -> DirectoryEntry {
    if entry.is_ref() || entry.is_intermediate() {
        return DirectoryEntry::malformed(None);
    }
    let entry = SearchEntry::construct(entry);

    let mut attributes: BTreeMap<String, Vec<Vec<u8>>> = entry
        .attrs
        .into_iter()
        .map(|(name, values)| (name, values.into_iter().map(String::into_bytes).collect()))
        .collect();
    for (name, values) in entry.bin_attrs {
        attributes.entry(name).or_default().extend(values);
    }

    DirectoryEntry::valid(entry.dn, attributes.into_iter().collect::<RawAttributes>())
}

impl Directory for LdapDirectory {
    fn search(&mut self, filter: &str, attributes: &[String]) -> DirectoryResult<EntryStream<'_>> {
        let conn = self.conn.as_mut().ok_or(DirectoryError::Closed)?;
        debug!(base = %self.base_dn, filter, ?attributes, "searching directory");

        let stream = conn
            .streaming_search_with(
                PagedResults::new(self.page_size),
                &self.base_dn,
                Scope::Subtree,
                filter,
                attributes.to_vec(),
            )
            .map_err(|e| DirectoryError::Search {
                filter: filter.to_owned(),
                reason: e.to_string(),
            })?;

        // `result` consumes the stream, so it is taken out once exhausted.
        let filter = filter.to_owned();
        let mut stream = Some(stream);
        let entries = std::iter::from_fn(move || {
            let search_error = |e: ldap3::LdapError| DirectoryError::Search {
                filter: filter.clone(),
                reason: e.to_string(),
            };
            match stream.as_mut()?.next() {
                Ok(Some(entry)) => Some(Ok(convert(entry))),
                Ok(None) => {
                    let done = stream.take()?;
                    done.result().success().err().map(|e| Err(search_error(e)))
                }
                Err(e) => {
                    stream = None;
                    Some(Err(search_error(e)))
                }
            }
        });
        Ok(Box::new(entries))
    }

    fn unbind(&mut self) -> DirectoryResult<()> {
        match self.conn.take() {
            Some(mut conn) => {
                conn.unbind()?;
                debug!("unbound from directory");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for LdapDirectory {
    fn drop(&mut self) {
        if let Err(e) = self.unbind() {
            warn!(error = %e, "failed to unbind directory connection");
        }
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("base_dn", &self.base_dn)
            .field("page_size", &self.page_size)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}
