//! The persisted check-in record.
//!
//! The JSON shape (camelCase field names) is shared by the durable store and
//! the export/import document. Decoding is lenient: stored data written by
//! older or hand-edited copies is repaired instead of rejected.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Setting keys with built-in defaults.
pub const SETTING_NOTIFICATIONS: &str = "notifications";
pub const SETTING_REMINDER_TIME: &str = "reminderTime";
pub const SETTING_TIMEZONE: &str = "timezone";

/// User preferences. Opaque to the streak logic apart from `timezone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

impl Default for Settings {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(SETTING_NOTIFICATIONS.to_string(), Value::Bool(false));
        map.insert(
            SETTING_REMINDER_TIME.to_string(),
            Value::String("09:00".to_string()),
        );
        map.insert(SETTING_TIMEZONE.to_string(), Value::String("UTC".to_string()));
        Self(map)
    }
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Key-by-key merge: keys in `other` overwrite, keys only in `self` stay.
    pub fn merge(&mut self, other: &Map<String, Value>) {
        for (key, value) in other {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn notifications(&self) -> bool {
        self.get(SETTING_NOTIFICATIONS)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn timezone(&self) -> Option<&str> {
        self.get(SETTING_TIMEZONE).and_then(Value::as_str)
    }
}

/// Everything known about one user's check-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub last_check_in: Option<DateTime<Utc>>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_check_ins: u32,
    pub tokens: f64,
    pub check_in_history: Vec<String>,
    pub settings: Settings,
}

impl Default for CheckInRecord {
    fn default() -> Self {
        Self {
            last_check_in: None,
            current_streak: 0,
            best_streak: 0,
            total_check_ins: 0,
            tokens: 0.0,
            check_in_history: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl CheckInRecord {
    /// Decode a possibly partial or malformed JSON value.
    ///
    /// - missing fields take their defaults
    /// - numeric fields accept numbers or numeric strings; negative or
    ///   non-numeric values become 0 and integer fields drop fractions
    /// - a non-array `checkInHistory` becomes empty; non-string entries are
    ///   dropped
    /// - an unparsable `lastCheckIn` becomes absent
    /// - object `settings` are merged over the defaults
    ///
    /// The result always satisfies `current_streak <= best_streak`.
    pub fn from_value_lenient(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let mut settings = Settings::default();
        if let Some(Value::Object(stored)) = obj.get("settings") {
            settings.merge(stored);
        }

        let check_in_history = match obj.get("checkInHistory") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        let mut record = Self {
            last_check_in: obj.get("lastCheckIn").and_then(lenient_timestamp),
            current_streak: lenient_count(obj.get("currentStreak")),
            best_streak: lenient_count(obj.get("bestStreak")),
            total_check_ins: lenient_count(obj.get("totalCheckIns")),
            tokens: lenient_amount(obj.get("tokens")),
            check_in_history,
            settings,
        };
        record.repair();
        record
    }

    /// Restore invariants that do not need outside context.
    pub fn repair(&mut self) {
        if self.current_streak > self.best_streak {
            self.best_streak = self.current_streak;
        }
        if !self.tokens.is_finite() || self.tokens < 0.0 {
            self.tokens = 0.0;
        }
    }

    pub fn to_value(&self) -> Value {
        // A record with finite tokens always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn lenient_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn lenient_count(value: Option<&Value>) -> u32 {
    match lenient_number(value) {
        Some(n) if n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn lenient_amount(value: Option<&Value>) -> f64 {
    match lenient_number(value) {
        Some(n) if n > 0.0 => n,
        _ => 0.0,
    }
}

fn lenient_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
