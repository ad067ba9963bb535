//! Core data models for the time-clock engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod employee;
mod report_period;
mod statistics;
mod sync;
mod tag_binding;
mod time_entry;

pub use attendance::{
    AttendanceEvent, AttendanceState, ClockAction, ClockNotice, Operation, ScanDisposition,
    ScanEvent, ScanOutcome,
};
pub use employee::{
    DEFAULT_BREAK_DURATION_MINUTES, Employee, EmployeeUpdate, Gender, NewEmployee,
    OFFLINE_EMPLOYEE_PREFIX,
};
pub use report_period::{ReportPeriod, month_start, week_start};
pub use statistics::{
    DailyHours, DurationBreakdown, EmployeeHours, EmployeeStats, RegisterRow, WeeklyStats,
};
pub use sync::{OfflineQueueItem, QueueOperation, SyncReport, SyncState, SyncStatus};
pub use tag_binding::{TagBinding, normalize_tag_uid};
pub use time_entry::{Break, EntryStatus, OFFLINE_ENTRY_PREFIX, TimeEntry};
