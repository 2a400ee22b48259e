//! Core error types for gm-checkin-core.
//!
//! Every error here is recoverable: callers degrade to defaults, keep the
//! current record, or surface a status message. None of them should leave a
//! `CheckInRecord` with broken invariants.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for gm-checkin-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Check-in rejected before any mutation
    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    /// Import document rejected
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Identity provider or ledger errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// The stored value is not a well-formed record
    #[error("Stored record under '{key}' is corrupt: {message}")]
    CorruptState { key: String, message: String },

    /// No data directory could be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDirUnavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Check-in rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckInError {
    /// A check-in already exists for this local date
    #[error("Already checked in today ({date}). Come back tomorrow!")]
    AlreadyCheckedIn { date: String },
}

/// Import validation errors.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Document parsed but does not have the record shape
    #[error("Invalid data format: {reason}")]
    InvalidFormat { reason: String },

    /// Document is not JSON at all
    #[error("Invalid data format: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from optional sources of truth (identity provider, ledger relay).
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response
    #[error("{service} returned HTTP {status}")]
    Status { service: String, status: u16 },

    /// Bearer credential rejected
    #[error("{service} rejected the credential")]
    Unauthorized { service: String },

    /// Capability not present (not configured, not connected)
    #[error("{0} is not available")]
    Unavailable(String),

    /// Response body did not match the expected shape
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    /// Base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_check_in_message_names_the_date() {
        let err = CheckInError::AlreadyCheckedIn {
            date: "2024-03-01".to_string(),
        };
        assert!(err.to_string().contains("2024-03-01"));
    }

    #[test]
    fn import_errors_convert_into_core_error() {
        let err: CoreError = ImportError::InvalidFormat {
            reason: "missing checkInHistory".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Import(_)));
        assert!(err.to_string().contains("missing checkInHistory"));
    }
}
