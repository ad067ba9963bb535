//! Statistics and register models.
//!
//! This module contains the figures produced by the duration calculator and
//! the reporting functions: per-shift duration breakdowns, weekly totals,
//! per-employee statistics and register rows.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EntryStatus, ReportPeriod};

/// Worked time of one shift, net of the automatic break deduction.
///
/// # Example
///
/// ```
/// use timeclock_engine::models::DurationBreakdown;
/// use rust_decimal::Decimal;
///
/// let breakdown = DurationBreakdown {
///     hours: 8,
///     minutes: 30,
///     display: "8h 30min".to_string(),
///     total_hours: Decimal::new(85, 1),
///     break_minutes: 30,
/// };
/// assert_eq!(breakdown.display, "8h 30min");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBreakdown {
    /// Whole worked hours.
    pub hours: i64,
    /// Remaining worked minutes, rounded.
    pub minutes: i64,
    /// Human readable form, e.g. `8h 30min`.
    pub display: String,
    /// Worked hours rounded to one decimal.
    pub total_hours: Decimal,
    /// Automatic break deducted, in minutes.
    pub break_minutes: u32,
}

impl DurationBreakdown {
    /// The breakdown of a shift that is still open.
    pub fn zero() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            display: "0h 0min".to_string(),
            total_hours: Decimal::ZERO,
            break_minutes: 0,
        }
    }
}

/// Hours recorded on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHours {
    /// The day.
    pub date: NaiveDate,
    /// Hours worked, rounded to one decimal.
    pub hours: Decimal,
    /// Manually logged break minutes, rounded.
    pub break_minutes: Decimal,
    /// Distinct employees with an entry starting that day.
    pub employees: usize,
}

/// Hours worked by one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeHours {
    /// The employee id.
    pub employee_id: String,
    /// The employee name, or `Unknown` when not in the directory.
    pub name: String,
    /// Hours, rounded to one decimal.
    pub hours: Decimal,
}

/// Dashboard figures for the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// Sunday that opens the week.
    pub week_start: NaiveDate,
    /// Net hours of completed shifts started this week.
    pub weekly_hours: Decimal,
    /// Hours beyond the weekly standard.
    pub overtime_hours: Decimal,
    /// Employees with an open shift started today.
    pub active_employees: usize,
    /// Employees in the directory.
    pub total_employees: usize,
    /// One row per day of the week, Sunday first.
    pub daily_breakdown: Vec<DailyHours>,
    /// Up to five employees with the most hours, descending.
    pub top_employees: Vec<EmployeeHours>,
}

/// Per-employee statistics over a reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeStats {
    /// The employee id.
    pub employee_id: String,
    /// The period the figures cover.
    pub period: ReportPeriod,
    /// Gross hours of completed entries, rounded to one decimal.
    pub total_hours: Decimal,
    /// Manually logged break minutes, rounded.
    pub total_break_minutes: Decimal,
    /// Distinct days with an entry.
    pub working_days: usize,
    /// Total hours divided by working days, rounded to one decimal.
    pub average_hours_per_day: Decimal,
    /// Hours beyond the period standard (40 a week, 160 a month).
    pub overtime_hours: Decimal,
    /// Entries with an end time.
    pub completed_entries: usize,
    /// All entries in the period.
    pub total_entries: usize,
    /// Per-day hours and breaks, oldest first.
    pub daily_breakdown: Vec<DailyHours>,
    /// Salary for the total hours, when the employee has a positive rate.
    pub salary: Option<Decimal>,
}

/// One line of the attendance register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRow {
    /// The entry id.
    pub entry_id: String,
    /// The employee id.
    pub employee_id: String,
    /// The employee name, or `Unknown`.
    pub employee_name: String,
    /// Day the shift started.
    pub date: NaiveDate,
    /// Clock-in time of day.
    pub start: NaiveTime,
    /// Clock-out time of day; `None` while in progress.
    pub end: Option<NaiveTime>,
    /// Gross duration in hours, rounded to one decimal.
    pub duration_hours: Decimal,
    /// Number of manually logged breaks.
    pub break_count: usize,
    /// Closed break minutes.
    pub break_minutes: Decimal,
    /// Entry status.
    pub status: EntryStatus,
}
