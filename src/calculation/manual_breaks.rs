//! Manually logged break time.

use rust_decimal::Decimal;

use crate::models::TimeEntry;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Sums the closed manual breaks of an entry, in minutes.
///
/// A break still in progress does not count. This figure is reported next to
/// the worked duration and is never subtracted from it.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::manual_break_minutes;
/// use timeclock_engine::models::{Break, TimeEntry};
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let at = |t: &str| NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S").unwrap();
/// let mut entry = TimeEntry::open("emp_001", at("2026-01-15 08:00:00"));
/// entry.breaks.push(Break {
///     start_time: at("2026-01-15 12:00:00"),
///     end_time: Some(at("2026-01-15 12:20:00")),
/// });
/// assert_eq!(manual_break_minutes(&entry), Decimal::new(20, 0));
/// ```
pub fn manual_break_minutes(entry: &TimeEntry) -> Decimal {
    let total_ms: i64 = entry
        .breaks
        .iter()
        .filter_map(|b| b.duration())
        .map(|d| d.num_milliseconds())
        .sum();
    Decimal::from(total_ms) / Decimal::from(MILLIS_PER_MINUTE)
}
