//! Reward constants and the milestone table.

use serde::{Deserialize, Serialize};

/// Tokens granted for every successful check-in.
pub const BASE_REWARD: f64 = 10.0;

/// A streak length that grants a one-time bonus on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Milestone {
    pub days: u32,
    pub bonus: f64,
    pub label: &'static str,
}

/// Canonical milestone table, ascending by `days`.
pub const MILESTONES: &[Milestone] = &[
    Milestone {
        days: 3,
        bonus: 20.0,
        label: "3-day streak achieved!",
    },
    Milestone {
        days: 7,
        bonus: 50.0,
        label: "7-day streak achieved!",
    },
    Milestone {
        days: 15,
        bonus: 100.0,
        label: "15-day streak achieved!",
    },
    Milestone {
        days: 30,
        bonus: 200.0,
        label: "30-day streak achieved!",
    },
    Milestone {
        days: 100,
        bonus: 500.0,
        label: "100-day streak achieved!",
    },
];

/// Exact-match lookup. A streak of 8 does not match the 7-day entry.
pub fn milestone_for(streak: u32) -> Option<&'static Milestone> {
    MILESTONES.iter().find(|m| m.days == streak)
}

/// Reward for a check-in that lands on `streak`.
pub fn reward_for(streak: u32) -> f64 {
    BASE_REWARD + milestone_for(streak).map_or(0.0, |m| m.bonus)
}

/// Reached/pending state of one milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub days: u32,
    pub bonus: f64,
    pub label: String,
    pub reached: bool,
}

pub fn milestone_progress(current_streak: u32) -> Vec<MilestoneProgress> {
    MILESTONES
        .iter()
        .map(|m| MilestoneProgress {
            days: m.days,
            bonus: m.bonus,
            label: m.label.to_string(),
            reached: current_streak >= m.days,
        })
        .collect()
}

/// The next milestone above `current_streak`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextMilestone {
    pub days: u32,
    pub bonus: f64,
    pub days_remaining: u32,
}

pub fn next_milestone(current_streak: u32) -> Option<NextMilestone> {
    MILESTONES
        .iter()
        .find(|m| m.days > current_streak)
        .map(|m| NextMilestone {
            days: m.days,
            bonus: m.bonus,
            days_remaining: m.days - current_streak,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ascending() {
        assert!(MILESTONES.windows(2).all(|w| w[0].days < w[1].days));
    }

    #[test]
    fn only_exact_streaks_match() {
        assert_eq!(milestone_for(7).map(|m| m.bonus), Some(50.0));
        assert!(milestone_for(8).is_none());
        assert!(milestone_for(0).is_none());
        assert_eq!(reward_for(3), 30.0);
        assert_eq!(reward_for(4), BASE_REWARD);
    }

    #[test]
    fn progress_marks_reached_milestones() {
        let progress = milestone_progress(10);
        let reached: Vec<u32> = progress
            .iter()
            .filter(|p| p.reached)
            .map(|p| p.days)
            .collect();
        assert_eq!(reached, vec![3, 7]);
    }

    #[test]
    fn next_milestone_counts_down() {
        assert_eq!(
            next_milestone(5),
            Some(NextMilestone { days: 7, bonus: 50.0, days_remaining: 2 })
        );
        assert_eq!(next_milestone(7).map(|n| n.days), Some(15));
        assert_eq!(next_milestone(100), None);
    }
}
