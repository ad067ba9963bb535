//! Reporting period model.
//!
//! This module contains the [`ReportPeriod`] type used to select the entries
//! that registers and statistics are computed over.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A window of time relative to "now" used to filter entries by start time.
///
/// Weeks start on Sunday at midnight, local time.
///
/// # Example
///
/// ```
/// use timeclock_engine::models::ReportPeriod;
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// // 2026-01-15 is a Thursday; its week opens on Sunday 2026-01-11.
/// let now = NaiveDateTime::parse_from_str("2026-01-15 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let (start, _) = ReportPeriod::Week.bounds(now);
/// assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 1, 11).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReportPeriod {
    /// Entries started today.
    Today,
    /// Entries started since Sunday 00:00.
    Week,
    /// Entries started since the first of the month.
    Month,
    /// Every entry.
    All,
    /// Entries started between two dates, both inclusive.
    Custom {
        /// First day of the window.
        start: NaiveDate,
        /// Last day of the window.
        end: NaiveDate,
    },
}

impl ReportPeriod {
    /// Returns the inclusive lower bound and optional inclusive upper bound for `now`.
    pub fn bounds(&self, now: NaiveDateTime) -> (NaiveDateTime, Option<NaiveDateTime>) {
        match self {
            ReportPeriod::Today => (now.date().and_time(NaiveTime::MIN), None),
            ReportPeriod::Week => (week_start(now.date()).and_time(NaiveTime::MIN), None),
            ReportPeriod::Month => (month_start(now.date()).and_time(NaiveTime::MIN), None),
            ReportPeriod::All => (NaiveDateTime::MIN, None),
            ReportPeriod::Custom { start, end } => (
                start.and_time(NaiveTime::MIN),
                Some(end_of_day(*end)),
            ),
        }
    }

    /// Checks whether an entry starting at `start_time` belongs to the period.
    pub fn contains(&self, start_time: NaiveDateTime, now: NaiveDateTime) -> bool {
        let (lower, upper) = self.bounds(now);
        let within_upper = upper.is_none_or(|upper| start_time <= upper);
        match self {
            ReportPeriod::Today => start_time.date() == now.date(),
            _ => start_time >= lower && within_upper,
        }
    }
}

/// Sunday opening the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// First day of the month that contains `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_start_is_previous_sunday() {
        // Thursday
        assert_eq!(week_start(make_date("2026-01-15")), make_date("2026-01-11"));
        // Sunday is its own week start
        assert_eq!(week_start(make_date("2026-01-11")), make_date("2026-01-11"));
        // Saturday
        assert_eq!(week_start(make_date("2026-01-17")), make_date("2026-01-11"));
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(make_date("2026-02-27")), make_date("2026-02-01"));
    }

    #[test]
    fn test_week_contains() {
        let now = make_datetime("2026-01-15", "10:00:00");
        assert!(ReportPeriod::Week.contains(make_datetime("2026-01-11", "00:00:00"), now));
        assert!(!ReportPeriod::Week.contains(make_datetime("2026-01-10", "23:59:59"), now));
    }

    #[test]
    fn test_today_contains_only_same_date() {
        let now = make_datetime("2026-01-15", "10:00:00");
        assert!(ReportPeriod::Today.contains(make_datetime("2026-01-15", "06:00:00"), now));
        assert!(!ReportPeriod::Today.contains(make_datetime("2026-01-14", "23:00:00"), now));
    }

    #[test]
    fn test_custom_end_is_inclusive() {
        let now = make_datetime("2026-03-01", "10:00:00");
        let period = ReportPeriod::Custom {
            start: make_date("2026-01-10"),
            end: make_date("2026-01-12"),
        };
        assert!(period.contains(make_datetime("2026-01-12", "23:30:00"), now));
        assert!(!period.contains(make_datetime("2026-01-13", "00:00:00"), now));
        assert!(!period.contains(make_datetime("2026-01-09", "23:59:00"), now));
    }

    #[test]
    fn test_period_serialization() {
        let json = serde_json::to_value(ReportPeriod::Month).unwrap();
        assert_eq!(json["kind"], "month");

        let custom: ReportPeriod = serde_json::from_str(
            r#"{"kind": "custom", "start": "2026-01-01", "end": "2026-01-31"}"#,
        )
        .unwrap();
        assert_eq!(
            custom,
            ReportPeriod::Custom {
                start: make_date("2026-01-01"),
                end: make_date("2026-01-31"),
            }
        );
    }
}
