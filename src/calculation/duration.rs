//! Worked duration of a shift.
//!
//! This module turns a shift's start and end times, plus the employee's
//! break policy, into the worked-time figures shown on registers and in
//! statistics. Only the automatic break deduction is subtracted here;
//! manually logged breaks are reported separately by
//! [`manual_break_minutes`](super::manual_break_minutes).

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::{DurationBreakdown, Employee, TimeEntry};

use super::automatic_break::automatic_break_minutes;
use super::rounding::{one_decimal, round_half_up};

const MILLIS_PER_MINUTE: i64 = 60_000;
const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Computes the worked duration of a shift.
///
/// The automatic break is deducted only when an employee is supplied, using
/// their break policy as the cap. Worked time never goes below zero.
///
/// `minutes` is the remainder rounded to the nearest minute, so a remainder
/// of 59.5 minutes or more displays as `0h 60min`.
///
/// # Arguments
///
/// * `start_time` - Clock-in time
/// * `end_time` - Clock-out time; `None` for an open shift
/// * `employee` - The employee whose break policy applies, if any
///
/// # Returns
///
/// A [`DurationBreakdown`]. Open shifts yield an all-zero breakdown.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::compute_duration;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let start = NaiveDateTime::parse_from_str("2026-01-15 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2026-01-15 17:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let gross = compute_duration(start, Some(end), None);
/// assert_eq!(gross.display, "9h 0min");
/// assert_eq!(gross.total_hours, Decimal::new(9, 0));
/// ```
pub fn compute_duration(
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    employee: Option<&Employee>,
) -> DurationBreakdown {
    let Some(end) = end_time else {
        return DurationBreakdown::zero();
    };

    let break_minutes = employee
        .map(|e| automatic_break_minutes(start_time, Some(end), Some(e.break_policy_minutes())))
        .unwrap_or(0);
    let work_minutes = net_work_minutes(start_time, end, break_minutes);

    let hours = (work_minutes / MINUTES_PER_HOUR).floor();
    let minutes = round_half_up(work_minutes % MINUTES_PER_HOUR, 0);
    let hours = hours.to_i64().unwrap_or_default();
    let minutes = minutes.to_i64().unwrap_or_default();

    DurationBreakdown {
        hours,
        minutes,
        display: format!("{}h {}min", hours, minutes),
        total_hours: one_decimal(work_minutes / MINUTES_PER_HOUR),
        break_minutes,
    }
}

/// Computes the duration of a recorded entry.
pub fn entry_duration(entry: &TimeEntry, employee: Option<&Employee>) -> DurationBreakdown {
    compute_duration(entry.start_time, entry.end_time, employee)
}

/// Unrounded net worked hours of an entry; zero while the shift is open.
///
/// Aggregations sum these before rounding so totals do not drift.
pub(crate) fn net_hours(entry: &TimeEntry, employee: Option<&Employee>) -> Decimal {
    let Some(end) = entry.end_time else {
        return Decimal::ZERO;
    };
    let break_minutes = employee
        .map(|e| automatic_break_minutes(entry.start_time, Some(end), Some(e.break_policy_minutes())))
        .unwrap_or(0);
    net_work_minutes(entry.start_time, end, break_minutes) / MINUTES_PER_HOUR
}

/// Unrounded gross hours of an entry; zero while the shift is open.
pub(crate) fn gross_hours(entry: &TimeEntry) -> Decimal {
    match entry.end_time {
        Some(end) => net_work_minutes(entry.start_time, end, 0) / MINUTES_PER_HOUR,
        None => Decimal::ZERO,
    }
}

fn net_work_minutes(start: NaiveDateTime, end: NaiveDateTime, break_minutes: u32) -> Decimal {
    let span_ms = (end - start).num_milliseconds();
    let work_ms = span_ms - i64::from(break_minutes) * MILLIS_PER_MINUTE;
    Decimal::from(work_ms.max(0)) / Decimal::from(MILLIS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn create_test_employee(break_duration: u32) -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Awa Diallo".to_string(),
            position: "Cashier".to_string(),
            gender: Some(Gender::F),
            hourly_rate: None,
            break_duration,
            start_time: None,
            end_time: None,
            profile_image: None,
        }
    }

    #[test]
    fn test_cd_001_nine_hour_shift_with_default_policy() {
        let employee = create_test_employee(30);
        let result = compute_duration(
            make_datetime("2026-01-15", "08:00:00"),
            Some(make_datetime("2026-01-15", "17:00:00")),
            Some(&employee),
        );

        assert_eq!(result.break_minutes, 30);
        assert_eq!(result.hours, 8);
        assert_eq!(result.minutes, 30);
        assert_eq!(result.display, "8h 30min");
        assert_eq!(result.total_hours, dec("8.5"));
    }

    #[test]
    fn test_cd_002_without_employee_no_deduction() {
        let result = compute_duration(
            make_datetime("2026-01-15", "08:00:00"),
            Some(make_datetime("2026-01-15", "17:00:00")),
            None,
        );
        assert_eq!(result.break_minutes, 0);
        assert_eq!(result.display, "9h 0min");
    }

    #[test]
    fn test_cd_003_open_shift_is_zero() {
        let employee = create_test_employee(30);
        let result = compute_duration(make_datetime("2026-01-15", "08:00:00"), None, Some(&employee));
        assert_eq!(result, DurationBreakdown::zero());
    }

    #[test]
    fn test_cd_004_zero_policy_uses_default_cap() {
        let employee = create_test_employee(0);
        let result = compute_duration(
            make_datetime("2026-01-15", "08:00:00"),
            Some(make_datetime("2026-01-15", "20:00:00")),
            Some(&employee),
        );
        assert_eq!(result.break_minutes, 30);
        assert_eq!(result.total_hours, dec("11.5"));
    }

    #[test]
    fn test_cd_005_short_shift_under_one_block() {
        let employee = create_test_employee(30);
        let result = compute_duration(
            make_datetime("2026-01-15", "08:00:00"),
            Some(make_datetime("2026-01-15", "10:20:00")),
            Some(&employee),
        );
        assert_eq!(result.break_minutes, 0);
        assert_eq!(result.display, "2h 20min");
        assert_eq!(result.total_hours, dec("2.3"));
    }

    #[test]
    fn test_cd_006_remainder_rounds_to_sixty_minutes() {
        let result = compute_duration(
            make_datetime("2026-01-15", "08:00:00"),
            Some(make_datetime("2026-01-15", "08:59:45")),
            None,
        );
        assert_eq!(result.hours, 0);
        assert_eq!(result.minutes, 60);
        assert_eq!(result.display, "0h 60min");
        assert_eq!(result.total_hours, dec("1.0"));
    }

    #[test]
    fn test_cd_007_end_before_start_clamps_to_zero() {
        let result = compute_duration(
            make_datetime("2026-01-15", "08:00:00"),
            Some(make_datetime("2026-01-15", "07:00:00")),
            None,
        );
        assert_eq!(result.hours, 0);
        assert_eq!(result.minutes, 0);
        assert_eq!(result.total_hours, Decimal::ZERO);
    }

    #[test]
    fn test_cd_008_manual_breaks_are_ignored() {
        let employee = create_test_employee(30);
        let mut entry = TimeEntry::open("emp_001", make_datetime("2026-01-15", "08:00:00"));
        entry.begin_break(make_datetime("2026-01-15", "12:00:00"));
        entry.finish_break(make_datetime("2026-01-15", "13:00:00"));
        entry.close(make_datetime("2026-01-15", "17:00:00"));

        let result = entry_duration(&entry, Some(&employee));
        assert_eq!(result.break_minutes, 30);
        assert_eq!(result.total_hours, dec("8.5"));
    }

    #[test]
    fn test_cd_009_is_deterministic() {
        let employee = create_test_employee(45);
        let start = make_datetime("2026-01-15", "06:10:00");
        let end = Some(make_datetime("2026-01-15", "18:47:00"));
        assert_eq!(
            compute_duration(start, end, Some(&employee)),
            compute_duration(start, end, Some(&employee))
        );
    }

    #[test]
    fn test_net_and_gross_hours() {
        let employee = create_test_employee(30);
        let mut entry = TimeEntry::open("emp_001", make_datetime("2026-01-15", "08:00:00"));
        assert_eq!(gross_hours(&entry), Decimal::ZERO);

        entry.close(make_datetime("2026-01-15", "17:00:00"));
        assert_eq!(gross_hours(&entry), dec("9"));
        assert_eq!(net_hours(&entry, Some(&employee)), dec("8.5"));
        assert_eq!(net_hours(&entry, None), dec("9"));
    }
}
