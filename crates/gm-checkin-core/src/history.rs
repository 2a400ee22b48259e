//! Calendar and share views derived from a record.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::day::DATE_FORMAT;
use crate::record::CheckInRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: String,
    pub checked_in: bool,
    pub today: bool,
}

/// One month of the check-in calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Weekday of the 1st, Sunday = 0. Number of blank cells before it.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
    pub checked_in_days: usize,
}

/// Build the calendar for `year`-`month`. Returns `None` for an invalid month.
pub fn month_view(
    year: i32,
    month: u32,
    history: &[String],
    today: NaiveDate,
) -> Option<MonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let days_in_month = next_first.signed_duration_since(first).num_days() as u32;

    let days: Vec<CalendarDay> = (1..=days_in_month)
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .map(|date| {
            let date_str = date.format(DATE_FORMAT).to_string();
            CalendarDay {
                day: date.day(),
                checked_in: history.iter().any(|h| *h == date_str),
                today: date == today,
                date: date_str,
            }
        })
        .collect();

    Some(MonthView {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        checked_in_days: days.iter().filter(|d| d.checked_in).count(),
        days,
    })
}

/// Parse a `YYYY-MM` month argument.
pub fn parse_month(value: &str) -> Option<(i32, u32)> {
    let (year, month) = value.trim().split_once('-')?;
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Whole amounts without decimals, otherwise two places.
pub fn format_tokens(tokens: f64) -> String {
    if tokens.fract() == 0.0 {
        format!("{tokens:.0}")
    } else {
        format!("{tokens:.2}")
    }
}

/// Progress message for sharing.
pub fn share_message(record: &CheckInRecord) -> String {
    format!(
        "I've maintained a {}-day check-in streak and earned {} tokens! 🔥",
        record.current_streak,
        format_tokens(record.tokens)
    )
}

/// Tiered achievement text for a streak.
pub fn achievement_message(streak: u32) -> String {
    match streak {
        s if s >= 100 => format!("💯 {s}-day GM streak! I'm officially a habit master!"),
        s if s >= 30 => format!("🏆 {s}-day GM streak! One month of consistency!"),
        s if s >= 7 => format!("⭐ {s}-day GM streak! One week strong!"),
        s => format!("🌟 {s}-day GM streak! Building momentum!"),
    }
}
