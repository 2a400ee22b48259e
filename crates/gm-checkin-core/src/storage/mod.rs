mod config;
pub mod database;
pub mod memory;
pub mod records;

pub use config::{CalendarConfig, Config, FarcasterConfig, LedgerConfig, LogConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use records::{RecordStore, RECORD_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Durable string key-value store.
///
/// A `set` must be all-or-nothing: after a failed write the previous value
/// is still readable.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `GM_CHECKIN_HOME` overrides the location outright. Otherwise this is
/// `~/.config/gm-checkin[-dev]/`, with the `-dev` suffix selected by
/// `GM_CHECKIN_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("GM_CHECKIN_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("GM_CHECKIN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("gm-checkin-dev")
            } else {
                base_dir.join("gm-checkin")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
