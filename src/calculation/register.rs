//! Attendance register rows.

use std::collections::HashMap;

use crate::models::{Employee, RegisterRow, TimeEntry};

use super::duration::gross_hours;
use super::manual_breaks::manual_break_minutes;
use super::rounding::{one_decimal, round_half_up};

/// Builds one register row per entry, in the order given.
///
/// Rows carry the gross duration and the manual break figures; the automatic
/// deduction is not applied here. Entries whose employee is missing from
/// `employees` are named `Unknown`.
pub fn register_rows(entries: &[TimeEntry], employees: &[Employee]) -> Vec<RegisterRow> {
    let names: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    entries
        .iter()
        .map(|entry| RegisterRow {
            entry_id: entry.id.clone(),
            employee_id: entry.employee_id.clone(),
            employee_name: names
                .get(entry.employee_id.as_str())
                .map(|name| name.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            date: entry.start_time.date(),
            start: entry.start_time.time(),
            end: entry.end_time.map(|end| end.time()),
            duration_hours: one_decimal(gross_hours(entry)),
            break_count: entry.breaks.len(),
            break_minutes: round_half_up(manual_break_minutes(entry), 0),
            status: entry.status,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryStatus;
    use chrono::{NaiveDateTime, NaiveTime};
    use rust_decimal::Decimal;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    #[test]
    fn test_rows_for_open_and_closed_entries() {
        let employees: Vec<Employee> =
            vec![serde_json::from_str(r#"{"id": "emp_001", "name": "Awa"}"#).unwrap()];

        let mut closed = TimeEntry::open("emp_001", make_datetime("2026-01-15", "08:00:00"));
        closed.id = "e1".to_string();
        closed.begin_break(make_datetime("2026-01-15", "12:00:00"));
        closed.finish_break(make_datetime("2026-01-15", "12:10:00"));
        closed.close(make_datetime("2026-01-15", "16:15:00"));

        let mut open = TimeEntry::open("ghost", make_datetime("2026-01-15", "09:00:00"));
        open.id = "e2".to_string();

        let rows = register_rows(&[closed, open], &employees);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].employee_name, "Awa");
        assert_eq!(rows[0].end, NaiveTime::from_hms_opt(16, 15, 0));
        assert_eq!(rows[0].duration_hours, Decimal::new(83, 1));
        assert_eq!(rows[0].break_count, 1);
        assert_eq!(rows[0].break_minutes, Decimal::new(10, 0));
        assert_eq!(rows[0].status, EntryStatus::Completed);

        assert_eq!(rows[1].employee_name, "Unknown");
        assert_eq!(rows[1].end, None);
        assert_eq!(rows[1].duration_hours, Decimal::ZERO);
        assert_eq!(rows[1].status, EntryStatus::Active);
    }
}
