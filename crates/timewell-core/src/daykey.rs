//! Day-key resolution.
//!
//! Sessions and daily logs are grouped by a "day key" -- a sortable
//! `YYYY-MM-DD` identifier for a rollover-adjusted calendar day. An instant
//! whose local hour is strictly before the configured rollover hour belongs
//! to the previous calendar day, so work finished at 01:30 with a rollover
//! hour of 4 still counts toward the evening before.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Validated rollover hour in `0..=23`.
///
/// `0` degenerates to ordinary midnight boundaries. Range checking happens
/// here, at configuration time; resolution itself is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RolloverHour(u8);

impl RolloverHour {
    pub const MIDNIGHT: RolloverHour = RolloverHour(0);

    pub fn new(hour: u8) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::RolloverHourOutOfRange(hour));
        }
        Ok(Self(hour))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RolloverHour {
    type Error = ValidationError;

    fn try_from(hour: u8) -> Result<Self, Self::Error> {
        Self::new(hour)
    }
}

impl From<RolloverHour> for u8 {
    fn from(hour: RolloverHour) -> u8 {
        hour.0
    }
}

impl Default for RolloverHour {
    fn default() -> Self {
        Self::MIDNIGHT
    }
}

/// A rollover-adjusted calendar day, serialized as `YYYY-MM-DD`.
///
/// Day keys sort lexicographically in chronological order, which the
/// storage layer relies on for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Attribute a local instant to its rollover-adjusted day.
    pub fn resolve(local: NaiveDateTime, rollover: RolloverHour) -> Self {
        let date = if local.hour() < u32::from(rollover.get()) {
            local.date().pred_opt().unwrap_or_else(|| local.date())
        } else {
            local.date()
        };
        Self(date)
    }

    /// Resolve an epoch-millisecond instant through the local timezone.
    pub fn resolve_ms(epoch_ms: i64, rollover: RolloverHour) -> Self {
        let local = match Local.timestamp_millis_opt(epoch_ms) {
            chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                dt.naive_local()
            }
            chrono::LocalResult::None => DateTime::from_timestamp_millis(epoch_ms)
                .map(|dt| dt.naive_utc())
                .unwrap_or_else(|| DateTime::UNIX_EPOCH.naive_utc()),
        };
        Self::resolve(local, rollover)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.
    pub fn pred(self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The day `days` before this one.
    pub fn back(self, days: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(days)).unwrap_or(self.0))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValidationError::MalformedDayKey(s.to_string()))
    }
}

impl TryFrom<String> for DayKey {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> String {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn rollover_hour_range() {
        assert!(RolloverHour::new(0).is_ok());
        assert!(RolloverHour::new(23).is_ok());
        assert!(RolloverHour::new(24).is_err());
    }

    #[test]
    fn before_rollover_belongs_to_previous_day() {
        let rollover = RolloverHour::new(4).unwrap();
        let key = DayKey::resolve(at(2026, 3, 10, 3, 59), rollover);
        assert_eq!(key.to_string(), "2026-03-09");
    }

    #[test]
    fn at_rollover_belongs_to_current_day() {
        let rollover = RolloverHour::new(4).unwrap();
        let key = DayKey::resolve(at(2026, 3, 10, 4, 0), rollover);
        assert_eq!(key.to_string(), "2026-03-10");
    }

    #[test]
    fn midnight_rollover_is_plain_calendar_day() {
        let key = DayKey::resolve(at(2026, 3, 10, 0, 0), RolloverHour::MIDNIGHT);
        assert_eq!(key.to_string(), "2026-03-10");
        let key = DayKey::resolve(at(2026, 3, 10, 23, 59), RolloverHour::MIDNIGHT);
        assert_eq!(key.to_string(), "2026-03-10");
    }

    #[test]
    fn rollover_crosses_month_boundary() {
        let rollover = RolloverHour::new(6).unwrap();
        let key = DayKey::resolve(at(2026, 3, 1, 2, 0), rollover);
        assert_eq!(key.to_string(), "2026-02-28");
    }

    #[test]
    fn day_keys_sort_chronologically() {
        let a: DayKey = "2026-01-31".parse().unwrap();
        let b: DayKey = "2026-02-01".parse().unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn back_walks_calendar_days() {
        let key: DayKey = "2026-03-02".parse().unwrap();
        assert_eq!(key.back(2).to_string(), "2026-02-28");
        assert_eq!(key.pred().to_string(), "2026-03-01");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-day".parse::<DayKey>().is_err());
        assert!("2026-13-01".parse::<DayKey>().is_err());
    }

    #[test]
    fn serde_round_trip_as_string() {
        let key: DayKey = "2026-03-10".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2026-03-10\"");
        let back: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
