//! Load/save of `CheckInRecord` on top of a [`KvStore`].

use serde_json::Value;

use super::KvStore;
use crate::error::StorageError;
use crate::record::CheckInRecord;

/// Storage key of the device-local record.
pub const RECORD_KEY: &str = "checkin_record";

/// One record per scope. `scope = None` is the device-local record; other
/// scopes (`fid:123`, `wallet:0xabc`) keep identities apart on one device.
///
/// Concurrent writers are not coordinated: the last `save` wins.
pub struct RecordStore<S> {
    store: S,
    key: String,
}

impl<S: KvStore> RecordStore<S> {
    pub fn new(store: S, scope: Option<&str>) -> Self {
        let key = match scope {
            Some(scope) if !scope.is_empty() => format!("{RECORD_KEY}:{scope}"),
            _ => RECORD_KEY.to_string(),
        };
        Self { store, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored record.
    ///
    /// A missing value yields the default record. A value that is not JSON is
    /// treated as corrupt and also yields the default; partially shaped JSON
    /// is repaired field by field.
    ///
    /// # Errors
    /// Returns an error only if the underlying store cannot be read.
    pub fn try_load(&self) -> Result<CheckInRecord, StorageError> {
        let Some(raw) = self.store.get(&self.key)? else {
            tracing::debug!(key = %self.key, "no stored record, using defaults");
            return Ok(CheckInRecord::default());
        };

        match decode(&self.key, &raw) {
            Ok(record) => Ok(record),
            Err(err) => {
                tracing::warn!(error = %err, "discarding corrupt record");
                Ok(CheckInRecord::default())
            }
        }
    }

    /// Like [`try_load`](Self::try_load), but an unavailable store also
    /// degrades to the default record.
    pub fn load(&self) -> CheckInRecord {
        self.try_load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, key = %self.key, "store unavailable, starting fresh");
            CheckInRecord::default()
        })
    }

    /// Write the whole record under this scope's key.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails; the previously
    /// stored value is left in place.
    pub fn save(&self, record: &CheckInRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(record).map_err(|e| StorageError::CorruptState {
            key: self.key.clone(),
            message: e.to_string(),
        })?;
        self.store.set(&self.key, &json)?;
        tracing::debug!(key = %self.key, total = record.total_check_ins, "saved record");
        Ok(())
    }

    /// Drop the stored record entirely.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}

fn decode(key: &str, raw: &str) -> Result<CheckInRecord, StorageError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| StorageError::CorruptState {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(StorageError::CorruptState {
            key: key.to_string(),
            message: "expected a JSON object".to_string(),
        });
    }
    Ok(CheckInRecord::from_value_lenient(&value))
}
