//! Property tests for the streak tracker invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use gm_checkin_core::rewards::milestone_for;
use gm_checkin_core::storage::RecordStore;
use gm_checkin_core::{CheckInRecord, MemoryStore, StreakTracker, BASE_REWARD};
use proptest::prelude::*;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 30, 6, 0, 0).unwrap()
}

proptest! {
    /// Walk through a random schedule of day gaps and check every invariant
    /// after each check-in.
    #[test]
    fn invariants_hold_over_random_schedules(
        gaps in prop::collection::vec(1i64..4, 1..60),
        minutes in prop::collection::vec(0i64..1440, 60),
    ) {
        let tracker = StreakTracker::default();
        let mut record = CheckInRecord::default();
        let mut day = start();
        let mut expected_streak = 0u32;

        for (i, gap) in gaps.iter().enumerate() {
            day += Duration::days(*gap);
            let now = day.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc()
                + Duration::minutes(minutes[i]);
            let before = record.clone();
            let (next, outcome) = tracker.perform_check_in(&record, now).unwrap();

            expected_streak = if i > 0 && *gap == 1 { expected_streak + 1 } else { 1 };
            prop_assert_eq!(next.current_streak, expected_streak);
            prop_assert!(next.current_streak <= next.best_streak);
            prop_assert_eq!(next.total_check_ins, before.total_check_ins + 1);
            prop_assert_eq!(next.check_in_history.len() as u32, next.total_check_ins);
            prop_assert!(next.tokens >= before.tokens);

            let bonus = milestone_for(expected_streak).map_or(0.0, |m| m.bonus);
            prop_assert_eq!(outcome.reward, BASE_REWARD + bonus);
            prop_assert_eq!(
                outcome.milestone.is_some(),
                milestone_for(expected_streak).is_some()
            );

            // Same day again: rejected.
            prop_assert!(!tracker.can_check_in_today(&next, now));
            let again = now + Duration::seconds(30);
            prop_assert!(tracker.perform_check_in(&next, again).is_err());

            record = next;
        }
    }

    /// Any record produced by check-ins survives a save/load cycle unchanged,
    /// including arbitrary fractional balances.
    #[test]
    fn save_load_round_trip(
        days in 1usize..40,
        skip_every in 2usize..9,
        tokens in prop::num::f64::POSITIVE
            | prop::num::f64::ZERO
            | prop::num::f64::NORMAL
            | prop::num::f64::SUBNORMAL,
    ) {
        prop_assume!(tokens.is_finite() && tokens >= 0.0);
        let tracker = StreakTracker::default();
        let mut record = CheckInRecord::default();
        let mut now = start();
        for i in 0..days {
            now += Duration::days(if i % skip_every == 0 { 2 } else { 1 });
            record = tracker.perform_check_in(&record, now).unwrap().0;
        }
        record.tokens = tokens;

        let records = RecordStore::new(MemoryStore::new(), None);
        records.save(&record).unwrap();
        prop_assert_eq!(records.load(), record);
    }
}

#[test]
fn cent_balances_survive_save_and_load() {
    let records = RecordStore::new(MemoryStore::new(), None);
    for tokens in [100000.01000000001, 0.1 + 0.2, 12.34, 5e-324, 1.7976931348623157e308] {
        let record = CheckInRecord {
            tokens,
            ..CheckInRecord::default()
        };
        records.save(&record).unwrap();
        assert_eq!(records.load().tokens, tokens, "balance {tokens:?} drifted");
    }
}
