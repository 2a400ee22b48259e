//! Local calendar-day resolution.
//!
//! Check-in eligibility and streak continuity are decided by comparing
//! `YYYY-MM-DD` strings, so every instant must be projected onto a local
//! date first. The projection is configurable: UTC, the host's local zone,
//! a fixed offset such as `+09:00`, or an IANA zone such as `Asia/Tokyo`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Date format used for history entries and day comparisons.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where local midnight falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    #[default]
    Utc,
    /// The host's local time zone.
    Local,
    Fixed(FixedOffset),
    /// IANA zone, DST-aware.
    Zone(Tz),
}

impl DayBoundary {
    /// Local calendar date of `instant`.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            DayBoundary::Utc => instant.date_naive(),
            DayBoundary::Local => instant.with_timezone(&Local).date_naive(),
            DayBoundary::Fixed(offset) => instant.with_timezone(offset).date_naive(),
            DayBoundary::Zone(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// `YYYY-MM-DD` string of `instant` in this boundary.
    pub fn date_string(&self, instant: DateTime<Utc>) -> String {
        self.date_of(instant).format(DATE_FORMAT).to_string()
    }

    /// Date string of the day before `instant` (`instant - 24h`).
    pub fn yesterday_string(&self, instant: DateTime<Utc>) -> String {
        self.date_string(instant - Duration::days(1))
    }

    /// Parse a user-facing timezone setting. Returns `None` for values that
    /// are neither an offset nor a known IANA zone.
    pub fn from_setting(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayBoundary::Utc => write!(f, "UTC"),
            DayBoundary::Local => write!(f, "local"),
            DayBoundary::Fixed(offset) => write!(f, "{offset}"),
            DayBoundary::Zone(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for DayBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" | "etc/utc" | "gmt" => return Ok(DayBoundary::Utc),
            "local" | "system" => return Ok(DayBoundary::Local),
            _ => {}
        }
        if let Some(offset) = parse_offset(trimmed) {
            return Ok(DayBoundary::Fixed(offset));
        }
        trimmed.parse::<Tz>().map(DayBoundary::Zone).map_err(|_| {
            format!("unknown timezone '{trimmed}' (expected UTC, local, +HH:MM or a zone name)")
        })
    }
}

/// Parses `+HH:MM`, `-HH:MM`, `+HHMM` and `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Serialize for DayBoundary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DayBoundary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
