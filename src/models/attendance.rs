//! Attendance states, operations and the events the engine publishes.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Employee, TagBinding, TimeEntry};

/// Per-employee attendance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    /// No open shift.
    Absent,
    /// Clocked in and working.
    Active,
    /// Clocked in with a break in progress.
    OnBreak,
}

impl fmt::Display for AttendanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttendanceState::Absent => "absent",
            AttendanceState::Active => "active",
            AttendanceState::OnBreak => "on break",
        })
    }
}

/// A state-machine operation, used to report rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Open a shift.
    ClockIn,
    /// Close the open shift.
    ClockOut,
    /// Start a manual break.
    StartBreak,
    /// End the manual break in progress.
    EndBreak,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::ClockIn => "clock in",
            Operation::ClockOut => "clock out",
            Operation::StartBreak => "start a break",
            Operation::EndBreak => "end a break",
        })
    }
}

/// The action a badge tap resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockAction {
    /// The tap opened a shift.
    ClockIn,
    /// The tap closed the open shift.
    ClockOut,
}

impl ClockAction {
    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            ClockAction::ClockIn => "clock-in",
            ClockAction::ClockOut => "clock-out",
        }
    }
}

/// A normalized badge tap pushed by the card reader collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// The tag identifier as read from the card.
    pub tag_uid: String,
    /// When the tap happened.
    pub scanned_at: NaiveDateTime,
}

/// Result of a scan that toggled an employee's attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// The resolved employee id.
    pub employee_id: String,
    /// Whether the tap clocked the employee in or out.
    pub action: ClockAction,
    /// The resolved employee, for greeting display.
    pub employee: Employee,
    /// The entry created or closed by the tap.
    pub entry: TimeEntry,
}

/// What a scan was used for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanDisposition {
    /// The tap toggled attendance.
    Attendance(ScanOutcome),
    /// The tap completed a pending tag registration.
    Registration(TagBinding),
}

/// Payload of a clock-in or clock-out notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockNotice {
    /// The employee who clocked.
    pub employee: Employee,
    /// Arrival or departure.
    pub action: ClockAction,
    /// When it happened.
    pub timestamp: NaiveDateTime,
    /// The affected entry.
    pub entry_id: String,
    /// Text to display in the welcome popup.
    pub greeting: String,
}

/// Events consumed by the notification and sound collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttendanceEvent {
    /// An employee clocked in or out.
    Clock(ClockNotice),
    /// An employee started a break.
    BreakStarted {
        /// The employee.
        employee_id: String,
        /// Break start.
        timestamp: NaiveDateTime,
    },
    /// An employee ended a break.
    BreakEnded {
        /// The employee.
        employee_id: String,
        /// Break end.
        timestamp: NaiveDateTime,
    },
    /// A tapped badge is not bound to anyone.
    UnknownTag {
        /// The normalized tag identifier.
        tag_uid: String,
        /// When the tap happened.
        timestamp: NaiveDateTime,
    },
    /// A tag was bound to an employee.
    TagRegistered(TagBinding),
}
