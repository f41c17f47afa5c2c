use thiserror::Error;

/// Errors from directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Could not open a connection to the directory server.
    #[error("connection to {uri} failed: {reason}")]
    Connection { uri: String, reason: String },

    /// The bind was rejected.
    #[error("bind as {dn} failed: {reason}")]
    Bind { dn: String, reason: String },

    /// A search failed to start or failed mid-stream.
    #[error("search {filter} failed: {reason}")]
    Search { filter: String, reason: String },

    /// The connection was already released.
    #[error("directory connection is closed")]
    Closed,

    /// Protocol-level error from the LDAP client.
    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),
}

/// Result alias for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
