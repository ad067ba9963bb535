//! Entry selection for registers and exports.

use chrono::NaiveDateTime;

use crate::models::{ReportPeriod, TimeEntry};

/// Selects the entries matching an optional employee and a period, newest first.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::filter_entries;
/// use timeclock_engine::models::{ReportPeriod, TimeEntry};
/// use chrono::NaiveDateTime;
///
/// let at = |t: &str| NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S").unwrap();
/// let entries = vec![
///     TimeEntry::open("emp_001", at("2026-01-14 08:00:00")),
///     TimeEntry::open("emp_002", at("2026-01-15 08:00:00")),
/// ];
///
/// let today = filter_entries(&entries, None, ReportPeriod::Today, at("2026-01-15 12:00:00"));
/// assert_eq!(today.len(), 1);
/// assert_eq!(today[0].employee_id, "emp_002");
/// ```
pub fn filter_entries(
    entries: &[TimeEntry],
    employee_id: Option<&str>,
    period: ReportPeriod,
    now: NaiveDateTime,
) -> Vec<TimeEntry> {
    let mut selected: Vec<TimeEntry> = entries
        .iter()
        .filter(|entry| employee_id.is_none_or(|id| entry.employee_id == id))
        .filter(|entry| period.contains(entry.start_time, now))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| a.id.cmp(&b.id)));
    selected
}
