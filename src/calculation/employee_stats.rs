//! Per-employee statistics over a reporting period.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::models::{DailyHours, Employee, EmployeeStats, ReportPeriod, TimeEntry};

use super::duration::gross_hours;
use super::manual_breaks::manual_break_minutes;
use super::rounding::{one_decimal, round_half_up};
use super::salary::salary;
use super::weekly_stats::{STANDARD_MONTHLY_HOURS, STANDARD_WEEKLY_HOURS};

/// Computes an employee's statistics for `period`.
///
/// Hours here are gross (clock-in to clock-out) and only completed entries
/// contribute to them. Overtime is measured against 40 hours for a week and
/// 160 hours for a month; other periods report none. The salary figure uses
/// the rounded total hours and is omitted when the employee has no positive
/// rate.
///
/// # Arguments
///
/// * `employee` - The employee to report on
/// * `entries` - Time entries of any employee; others are ignored
/// * `period` - The window of entry start times to include
/// * `now` - Reference time for relative periods
pub fn employee_stats(
    employee: &Employee,
    entries: &[TimeEntry],
    period: ReportPeriod,
    now: NaiveDateTime,
) -> EmployeeStats {
    let selected: Vec<&TimeEntry> = entries
        .iter()
        .filter(|entry| entry.employee_id == employee.id)
        .filter(|entry| period.contains(entry.start_time, now))
        .collect();

    let mut total_hours = Decimal::ZERO;
    let mut total_breaks = Decimal::ZERO;
    let mut completed_entries = 0;
    let mut per_day: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();

    for entry in &selected {
        let hours = gross_hours(entry);
        let breaks = manual_break_minutes(entry);
        if !entry.is_open() {
            completed_entries += 1;
        }
        total_hours += hours;
        total_breaks += breaks;

        let day = per_day.entry(entry.start_time.date()).or_default();
        day.0 += hours;
        day.1 += breaks;
    }

    let working_days = per_day.len();
    let average = if working_days > 0 {
        total_hours / Decimal::from(working_days)
    } else {
        Decimal::ZERO
    };

    let standard = match period {
        ReportPeriod::Week => Some(STANDARD_WEEKLY_HOURS),
        ReportPeriod::Month => Some(STANDARD_MONTHLY_HOURS),
        _ => None,
    };
    let overtime = standard
        .map(|standard| (total_hours - standard).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);

    let daily_breakdown = per_day
        .into_iter()
        .map(|(date, (hours, breaks))| DailyHours {
            date,
            hours: one_decimal(hours),
            break_minutes: round_half_up(breaks, 0),
            employees: 1,
        })
        .collect();

    let total_hours = one_decimal(total_hours);

    EmployeeStats {
        employee_id: employee.id.clone(),
        period,
        total_hours,
        total_break_minutes: round_half_up(total_breaks, 0),
        working_days,
        average_hours_per_day: one_decimal(average),
        overtime_hours: one_decimal(overtime),
        completed_entries,
        total_entries: selected.len(),
        daily_breakdown,
        salary: salary(total_hours, employee.hourly_rate),
    }
}
