use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading and resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown {kind} callback: {name}")]
    UnknownHook { kind: &'static str, name: String },
}

/// Errors raised by hooks.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook {hook} failed: {reason}")]
    Failed { hook: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] dirsync_store::StoreError),
}

pub type HookResult<T> = Result<T, HookError>;

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("directory error: {0}")]
    Directory(#[from] dirsync_directory::DirectoryError),

    #[error("store error: {0}")]
    Store(#[from] dirsync_store::StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;
