//! Check-in service: the record store, the streak tracker and a stat source
//! wired together.
//!
//! The service is constructed explicitly and owned by the caller. Every
//! mutation re-reads the stored record first and writes it back in one
//! `save`, so the window for lost updates between processes is a single
//! operation; across processes the last `save` still wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::day::DayBoundary;
use crate::error::{ConfigError, ImportError, Result, SourceError};
use crate::history::{month_view, MonthView};
use crate::record::{CheckInRecord, SETTING_TIMEZONE};
use crate::rewards::{next_milestone, NextMilestone};
use crate::sources::{Receipt, SourceKind, StatSource};
use crate::storage::{KvStore, RecordStore};
use crate::tracker::{CheckInOutcome, DayStatus, StreakTracker};

/// Snapshot for rendering the main screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: DayStatus,
    pub today: String,
    pub timezone: String,
    pub source: SourceKind,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_check_ins: u32,
    pub tokens: f64,
    pub last_check_in: Option<DateTime<Utc>>,
    pub next_milestone: Option<NextMilestone>,
}

/// Everything that happened during one check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInReport {
    pub outcome: CheckInOutcome,
    pub record: CheckInRecord,
    pub source: SourceKind,
    /// Remote confirmation, when the source settles check-ins.
    pub receipt: Option<Receipt>,
    /// False if the durable store rejected the write; the check-in then only
    /// lives in this report.
    pub persisted: bool,
}

pub struct CheckInService<S> {
    records: RecordStore<S>,
    source: Box<dyn StatSource>,
    default_boundary: DayBoundary,
}

impl<S: KvStore> CheckInService<S> {
    /// `default_boundary` applies when the record's `timezone` setting cannot
    /// be resolved.
    pub fn new(store: S, source: Box<dyn StatSource>, default_boundary: DayBoundary) -> Self {
        let scope = source.scope();
        Self {
            records: RecordStore::new(store, scope.as_deref()),
            source,
            default_boundary,
        }
    }

    pub fn source(&self) -> &dyn StatSource {
        self.source.as_ref()
    }

    pub fn storage_key(&self) -> &str {
        self.records.key()
    }

    pub fn record(&self) -> CheckInRecord {
        self.records.load()
    }

    /// Tracker for `record`: its own timezone setting wins over the default.
    pub fn tracker_for(&self, record: &CheckInRecord) -> StreakTracker {
        let boundary = match record.settings.timezone() {
            Some(name) => DayBoundary::from_setting(name).unwrap_or_else(|| {
                tracing::warn!(
                    timezone = name,
                    fallback = %self.default_boundary,
                    "unresolvable timezone setting"
                );
                self.default_boundary
            }),
            None => self.default_boundary,
        };
        StreakTracker::new(boundary)
    }

    pub fn status(&self, now: DateTime<Utc>) -> StatusReport {
        let record = self.records.load();
        let tracker = self.tracker_for(&record);
        StatusReport {
            status: tracker.day_status(&record, now),
            today: tracker.boundary().date_string(now),
            timezone: tracker.boundary().to_string(),
            source: self.source.kind(),
            current_streak: record.current_streak,
            best_streak: record.best_streak,
            total_check_ins: record.total_check_ins,
            tokens: record.tokens,
            last_check_in: record.last_check_in,
            next_milestone: next_milestone(record.current_streak),
        }
    }

    /// Record today's check-in, then forward it to the source if one is
    /// available. Source failures are logged and the local check-in stands.
    ///
    /// # Errors
    /// Returns [`crate::error::CheckInError::AlreadyCheckedIn`] (wrapped) if
    /// today already has a check-in; nothing is written in that case.
    pub async fn check_in(&self, now: DateTime<Utc>) -> Result<CheckInReport> {
        let record = self.records.load();
        let tracker = self.tracker_for(&record);
        let (mut updated, outcome) = tracker.perform_check_in(&record, now)?;
        tracing::info!(
            streak = outcome.new_streak,
            reward = outcome.reward,
            milestone = outcome.milestone.as_deref().unwrap_or("-"),
            "checked in"
        );
        let mut persisted = self.commit(&mut updated);

        let mut receipt = None;
        if self.source.is_available() {
            match self.source.submit_check_in(&outcome).await {
                Ok(r) => receipt = r,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        source = %self.source.kind(),
                        "remote check-in failed, keeping local result"
                    );
                }
            }
        }

        if receipt.is_some() {
            match self.source.fetch_stats().await {
                Ok(Some(stats)) => {
                    let mut merged = stats.apply_to(&self.records.load());
                    persisted = self.commit(&mut merged);
                    updated = merged;
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(error = %err, "could not refresh remote stats"),
            }
        }

        Ok(CheckInReport {
            outcome,
            record: updated,
            source: self.source.kind(),
            receipt,
            persisted,
        })
    }

    /// Pull stats from the source and overlay them on the stored record.
    /// Returns `None` when the source keeps no stats of its own.
    ///
    /// # Errors
    /// [`SourceError::Unavailable`] if the source is not available, any
    /// source error, or a storage error when saving the merged record.
    pub async fn sync(&self) -> Result<Option<CheckInRecord>> {
        if !self.source.is_available() {
            return Err(SourceError::Unavailable(self.source.kind().to_string()).into());
        }
        let Some(stats) = self.source.fetch_stats().await? else {
            return Ok(None);
        };
        let mut merged = stats.apply_to(&self.records.load());
        merged.repair();
        self.records.save(&merged)?;
        tracing::info!(
            streak = merged.current_streak,
            total = merged.total_check_ins,
            "synced remote stats"
        );
        Ok(Some(merged))
    }

    /// Whole record as a pretty-printed JSON document.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records.load())?)
    }

    /// Validate and merge an exported document.
    ///
    /// # Errors
    /// [`ImportError`] if the text is not a valid record document (the stored
    /// record is untouched), or a storage error if the save fails.
    pub fn import(&self, text: &str) -> Result<CheckInRecord> {
        let incoming: Value = serde_json::from_str(text).map_err(ImportError::from)?;
        let current = self.records.load();
        let mut merged = self.tracker_for(&current).import_record(&current, &incoming)?;
        merged.repair();
        self.records.save(&merged)?;
        tracing::info!(total = merged.total_check_ins, "imported record");
        Ok(merged)
    }

    /// Reset to defaults, keeping settings.
    ///
    /// # Errors
    /// Returns a storage error if the save fails.
    pub fn reset(&self) -> Result<CheckInRecord> {
        let current = self.records.load();
        let reset = self.tracker_for(&current).reset_record(&current);
        self.records.save(&reset)?;
        tracing::info!("record reset");
        Ok(reset)
    }

    /// Set one settings key.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] if `timezone` is set to something that
    /// does not resolve to a day boundary, or a storage error if the save
    /// fails.
    pub fn update_setting(&self, key: &str, value: Value) -> Result<CheckInRecord> {
        if key == SETTING_TIMEZONE {
            let resolves = value.as_str().and_then(DayBoundary::from_setting).is_some();
            if !resolves {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{value} is not a UTC offset or known timezone"),
                }
                .into());
            }
        }
        let mut record = self.records.load();
        record.settings.set(key, value);
        self.records.save(&record)?;
        Ok(record)
    }

    /// Calendar for a month, with today marked in the record's timezone.
    pub fn month(&self, year: i32, month: u32, now: DateTime<Utc>) -> Option<MonthView> {
        let record = self.records.load();
        let today = self.tracker_for(&record).boundary().date_of(now);
        month_view(year, month, &record.check_in_history, today)
    }

    fn commit(&self, record: &mut CheckInRecord) -> bool {
        record.repair();
        match self.records.save(record) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "failed to save record");
                false
            }
        }
    }
}
