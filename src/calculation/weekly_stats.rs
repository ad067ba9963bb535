//! Weekly dashboard statistics.
//!
//! This module aggregates the current week's completed shifts into the
//! dashboard figures: net hours worked, overtime beyond the standard week,
//! who is currently clocked in, a per-day breakdown and the top employees.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Days, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::models::{DailyHours, Employee, EmployeeHours, TimeEntry, WeeklyStats, week_start};

use super::duration::net_hours;
use super::manual_breaks::manual_break_minutes;
use super::rounding::{one_decimal, round_half_up};

/// Standard hours in a working week; hours beyond this are overtime.
pub const STANDARD_WEEKLY_HOURS: Decimal = Decimal::from_parts(40, 0, 0, false, 0);

/// Standard hours in a working month.
pub const STANDARD_MONTHLY_HOURS: Decimal = Decimal::from_parts(160, 0, 0, false, 0);

const TOP_EMPLOYEES: usize = 5;

/// Computes the dashboard statistics for the week containing `now`.
///
/// Hours are net of each employee's automatic break deduction and only
/// completed shifts starting on or after Sunday 00:00 count. Entries whose
/// employee is not in `employees` are counted without a deduction.
///
/// Active employees are those with an open shift that started today.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::weekly_stats;
/// use chrono::NaiveDateTime;
///
/// let now = NaiveDateTime::parse_from_str("2026-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let stats = weekly_stats(&[], &[], now);
/// assert_eq!(stats.daily_breakdown.len(), 7);
/// assert!(stats.top_employees.is_empty());
/// ```
pub fn weekly_stats(entries: &[TimeEntry], employees: &[Employee], now: NaiveDateTime) -> WeeklyStats {
    let directory: HashMap<&str, &Employee> =
        employees.iter().map(|e| (e.id.as_str(), e)).collect();
    let week_start_date = week_start(now.date());
    let week_start_at = week_start_date.and_time(NaiveTime::MIN);
    let today = now.date();

    let mut weekly_hours = Decimal::ZERO;
    let mut per_employee: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut per_day: BTreeMap<chrono::NaiveDate, (Decimal, Decimal, BTreeSet<&str>)> =
        BTreeMap::new();
    let mut active: BTreeSet<&str> = BTreeSet::new();

    for entry in entries {
        if entry.is_open() && entry.start_time.date() == today {
            active.insert(entry.employee_id.as_str());
        }
        if entry.start_time < week_start_at {
            continue;
        }

        let employee = directory.get(entry.employee_id.as_str()).copied();
        let hours = net_hours(entry, employee);
        let day = per_day.entry(entry.start_time.date()).or_default();
        day.1 += manual_break_minutes(entry);
        day.2.insert(entry.employee_id.as_str());

        if entry.is_open() {
            continue;
        }
        weekly_hours += hours;
        day.0 += hours;
        *per_employee.entry(entry.employee_id.as_str()).or_default() += hours;
    }

    let daily_breakdown = (0..7)
        .filter_map(|offset| week_start_date.checked_add_days(Days::new(offset)))
        .map(|date| {
            let (hours, breaks, people) = per_day.remove(&date).unwrap_or_default();
            DailyHours {
                date,
                hours: one_decimal(hours),
                break_minutes: round_half_up(breaks, 0),
                employees: people.len(),
            }
        })
        .collect();

    let mut top_employees: Vec<EmployeeHours> = per_employee
        .into_iter()
        .map(|(employee_id, hours)| EmployeeHours {
            employee_id: employee_id.to_string(),
            name: directory
                .get(employee_id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            hours,
        })
        .collect();
    top_employees.sort_by(|a, b| b.hours.cmp(&a.hours).then_with(|| a.name.cmp(&b.name)));
    top_employees.truncate(TOP_EMPLOYEES);
    for item in &mut top_employees {
        item.hours = one_decimal(item.hours);
    }

    WeeklyStats {
        week_start: week_start_date,
        weekly_hours: one_decimal(weekly_hours),
        overtime_hours: one_decimal((weekly_hours - STANDARD_WEEKLY_HOURS).max(Decimal::ZERO)),
        active_employees: active.len(),
        total_employees: employees.len(),
        daily_breakdown,
        top_employees,
    }
}
