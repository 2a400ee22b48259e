//! Streak and reward calculation.
//!
//! `StreakTracker` is a pure calculator: every operation takes the current
//! record and the current instant and returns a new record. Persistence and
//! remote sources live in [`crate::service`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::day::DayBoundary;
use crate::error::{CheckInError, ImportError};
use crate::record::CheckInRecord;
use crate::rewards::{milestone_for, reward_for};

/// Derived per-day state. Never stored: it flips back to `Eligible` once
/// local midnight passes, the next time it is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Eligible,
    CheckedInToday,
}

/// Result of a successful check-in, for rendering a confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    pub reward: f64,
    pub milestone: Option<String>,
    pub new_streak: u32,
    /// Local date string appended to the history.
    pub date: String,
    pub checked_in_at: DateTime<Utc>,
}

/// Fields required for an import document to be accepted.
const REQUIRED_NUMERIC_FIELDS: [&str; 3] = ["currentStreak", "totalCheckIns", "tokens"];

#[derive(Debug, Clone, Copy, Default)]
pub struct StreakTracker {
    boundary: DayBoundary,
}

impl StreakTracker {
    pub fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    /// False iff the last check-in falls on the same local day as `now`.
    pub fn can_check_in_today(&self, record: &CheckInRecord, now: DateTime<Utc>) -> bool {
        match record.last_check_in {
            Some(last) => self.boundary.date_string(last) != self.boundary.date_string(now),
            None => true,
        }
    }

    pub fn day_status(&self, record: &CheckInRecord, now: DateTime<Utc>) -> DayStatus {
        if self.can_check_in_today(record, now) {
            DayStatus::Eligible
        } else {
            DayStatus::CheckedInToday
        }
    }

    /// Streak the next check-in at `now` would produce.
    pub fn streak_after_check_in(&self, record: &CheckInRecord, now: DateTime<Utc>) -> u32 {
        match record.last_check_in {
            Some(last)
                if self.boundary.date_string(last) == self.boundary.yesterday_string(now) =>
            {
                record.current_streak.saturating_add(1)
            }
            _ => 1,
        }
    }

    /// Apply today's check-in.
    ///
    /// # Errors
    /// Returns [`CheckInError::AlreadyCheckedIn`] if `record` already has a
    /// check-in on `now`'s local date. The input is never modified.
    pub fn perform_check_in(
        &self,
        record: &CheckInRecord,
        now: DateTime<Utc>,
    ) -> Result<(CheckInRecord, CheckInOutcome), CheckInError> {
        let today = self.boundary.date_string(now);
        if !self.can_check_in_today(record, now) {
            return Err(CheckInError::AlreadyCheckedIn { date: today });
        }

        let new_streak = self.streak_after_check_in(record, now);
        let milestone = milestone_for(new_streak);
        let reward = reward_for(new_streak);

        let mut updated = record.clone();
        updated.last_check_in = Some(now);
        updated.current_streak = new_streak;
        updated.total_check_ins = updated.total_check_ins.saturating_add(1);
        updated.tokens += reward;
        updated.check_in_history.push(today.clone());
        updated.best_streak = updated.best_streak.max(new_streak);

        let outcome = CheckInOutcome {
            reward,
            milestone: milestone.map(|m| m.label.to_string()),
            new_streak,
            date: today,
            checked_in_at: now,
        };
        Ok((updated, outcome))
    }

    /// Merge an imported document into `current`.
    ///
    /// Top-level fields present in `incoming` replace those of `current`;
    /// `settings` are merged key by key. The merged record is repaired the
    /// same way a stored record is on load.
    ///
    /// # Errors
    /// Returns [`ImportError::InvalidFormat`] if `incoming` is not an object,
    /// lacks a numeric `currentStreak`, `totalCheckIns` or `tokens`, or lacks
    /// an array `checkInHistory`.
    pub fn import_record(
        &self,
        current: &CheckInRecord,
        incoming: &Value,
    ) -> Result<CheckInRecord, ImportError> {
        let obj = incoming.as_object().ok_or_else(|| ImportError::InvalidFormat {
            reason: "expected a JSON object".to_string(),
        })?;

        for field in REQUIRED_NUMERIC_FIELDS {
            if !obj.get(field).is_some_and(Value::is_number) {
                return Err(ImportError::InvalidFormat {
                    reason: format!("'{field}' must be a number"),
                });
            }
        }
        if !obj.get("checkInHistory").is_some_and(Value::is_array) {
            return Err(ImportError::InvalidFormat {
                reason: "'checkInHistory' must be an array".to_string(),
            });
        }

        let mut merged = match current.to_value() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in obj {
            if key == "settings" {
                if let (Some(Value::Object(target)), Value::Object(patch)) =
                    (merged.get_mut("settings"), value)
                {
                    for (k, v) in patch {
                        target.insert(k.clone(), v.clone());
                    }
                }
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }

        Ok(CheckInRecord::from_value_lenient(&Value::Object(merged)))
    }

    /// Defaults everywhere except `settings`.
    pub fn reset_record(&self, current: &CheckInRecord) -> CheckInRecord {
        CheckInRecord {
            settings: current.settings.clone(),
            ..CheckInRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::{BASE_REWARD, MILESTONES};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(n - 1)
    }

    fn tracker() -> StreakTracker {
        StreakTracker::default()
    }

    #[test]
    fn first_check_in_starts_streak() {
        let (record, outcome) = tracker()
            .perform_check_in(&CheckInRecord::default(), day(1))
            .unwrap();
        assert_eq!(record.current_streak, 1);
        assert_eq!(record.best_streak, 1);
        assert_eq!(record.total_check_ins, 1);
        assert_eq!(record.tokens, BASE_REWARD);
        assert_eq!(record.check_in_history, vec!["2024-01-01"]);
        assert_eq!(outcome.reward, BASE_REWARD);
        assert_eq!(outcome.milestone, None);
        assert_eq!(outcome.new_streak, 1);
    }

    #[test]
    fn second_check_in_same_day_is_rejected() {
        let t = tracker();
        let (record, _) = t
            .perform_check_in(&CheckInRecord::default(), day(1))
            .unwrap();
        let later = day(1) + Duration::hours(11);
        assert!(!t.can_check_in_today(&record, later));
        assert_eq!(t.day_status(&record, later), DayStatus::CheckedInToday);

        let err = t.perform_check_in(&record, later).unwrap_err();
        assert_eq!(
            err,
            CheckInError::AlreadyCheckedIn {
                date: "2024-01-01".to_string()
            }
        );
    }

    #[test]
    fn eligibility_returns_after_midnight() {
        let t = tracker();
        let (record, _) = t
            .perform_check_in(&CheckInRecord::default(), day(1))
            .unwrap();
        assert_eq!(t.day_status(&record, day(2)), DayStatus::Eligible);
    }

    #[test]
    fn streak_scenario_with_gap_and_milestone() {
        let t = tracker();
        let (r, _) = t.perform_check_in(&CheckInRecord::default(), day(1)).unwrap();
        let (r, _) = t.perform_check_in(&r, day(2)).unwrap();
        assert_eq!(r.current_streak, 2);

        // Day 3 skipped.
        let (r, o) = t.perform_check_in(&r, day(4)).unwrap();
        assert_eq!(r.current_streak, 1);
        assert_eq!(r.best_streak, 2);
        assert_eq!(o.milestone, None);

        let (r, o) = t.perform_check_in(&r, day(5)).unwrap();
        assert_eq!(o.reward, BASE_REWARD);
        let tokens_before = r.tokens;
        let (r, o) = t.perform_check_in(&r, day(6)).unwrap();
        assert_eq!(r.current_streak, 3);
        assert_eq!(o.milestone.as_deref(), Some("3-day streak achieved!"));
        assert_eq!(o.reward, BASE_REWARD + 20.0);
        assert_eq!(r.tokens, tokens_before + BASE_REWARD + 20.0);
        assert_eq!(r.total_check_ins, 5);
        assert_eq!(r.check_in_history.len(), 5);
    }

    #[test]
    fn milestone_not_regranted_past_its_day() {
        let t = tracker();
        let mut record = CheckInRecord::default();
        let mut bonuses = Vec::new();
        for n in 1..=10 {
            let (next, outcome) = t.perform_check_in(&record, day(n)).unwrap();
            if outcome.milestone.is_some() {
                bonuses.push(outcome.new_streak);
            }
            record = next;
        }
        assert_eq!(bonuses, vec![3, 7]);
        let expected = 10.0 * BASE_REWARD + MILESTONES[0].bonus + MILESTONES[1].bonus;
        assert_eq!(record.tokens, expected);
    }

    #[test]
    fn day_boundary_decides_consecutiveness() {
        // 23:00 UTC on Jan 1 and 01:00 UTC on Jan 3 are consecutive days in UTC-03:00.
        let t = StreakTracker::new("-03:00".parse().unwrap());
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 3, 1, 0, 0).unwrap();
        let (r, o1) = t.perform_check_in(&CheckInRecord::default(), first).unwrap();
        let (r, o2) = t.perform_check_in(&r, second).unwrap();
        assert_eq!(o1.date, "2024-01-01");
        assert_eq!(o2.date, "2024-01-02");
        assert_eq!(r.current_streak, 2);
    }

    #[test]
    fn import_rejects_missing_history() {
        let current = CheckInRecord::default();
        let err = tracker()
            .import_record(
                &current,
                &json!({ "currentStreak": 1, "totalCheckIns": 1, "tokens": 10 }),
            )
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidFormat { .. }));
    }

    #[test]
    fn import_rejects_non_numeric_fields() {
        let err = tracker()
            .import_record(
                &CheckInRecord::default(),
                &json!({
                    "currentStreak": "3",
                    "totalCheckIns": 3,
                    "tokens": 30,
                    "checkInHistory": []
                }),
            )
            .unwrap_err();
        assert!(err.to_string().contains("currentStreak"));
    }

    #[test]
    fn import_merges_settings_key_by_key() {
        let mut current = CheckInRecord::default();
        current.settings.set("reminderTime", json!("07:30"));
        current.settings.set("useBlockchain", json!(true));

        let merged = tracker()
            .import_record(
                &current,
                &json!({
                    "currentStreak": 5,
                    "bestStreak": 2,
                    "totalCheckIns": 9,
                    "tokens": 120,
                    "checkInHistory": ["2024-01-01"],
                    "settings": { "notifications": true }
                }),
            )
            .unwrap();

        assert_eq!(merged.current_streak, 5);
        assert_eq!(merged.best_streak, 5, "repaired after merge");
        assert_eq!(merged.total_check_ins, 9);
        assert_eq!(merged.tokens, 120.0);
        assert!(merged.settings.notifications());
        assert_eq!(merged.settings.get("reminderTime"), Some(&json!("07:30")));
        assert_eq!(merged.settings.get("useBlockchain"), Some(&json!(true)));
    }

    #[test]
    fn import_keeps_fields_absent_from_document() {
        let mut current = CheckInRecord::default();
        current.last_check_in = Some(day(3));
        let merged = tracker()
            .import_record(
                &current,
                &json!({
                    "currentStreak": 1,
                    "totalCheckIns": 1,
                    "tokens": 10,
                    "checkInHistory": ["2024-01-03"]
                }),
            )
            .unwrap();
        assert_eq!(merged.last_check_in, Some(day(3)));
    }

    #[test]
    fn reset_preserves_settings_only() {
        let t = tracker();
        let (mut record, _) = t
            .perform_check_in(&CheckInRecord::default(), day(1))
            .unwrap();
        record.settings.set("notifications", json!(true));
        let reset = t.reset_record(&record);
        assert_eq!(reset.total_check_ins, 0);
        assert_eq!(reset.tokens, 0.0);
        assert_eq!(reset.last_check_in, None);
        assert!(reset.settings.notifications());
    }
}
