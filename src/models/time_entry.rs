//! Time entry model and related types.
//!
//! This module defines the TimeEntry and Break structs that record one
//! shift from clock-in to clock-out, with any manually logged pauses.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::AttendanceState;

/// Id prefix reserved for entries created while the remote store was unreachable.
pub const OFFLINE_ENTRY_PREFIX: &str = "offline_";

/// Lifecycle status of a time entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// The employee is working.
    Active,
    /// The employee is on a manually logged break.
    OnBreak,
    /// The shift has been clocked out.
    Completed,
}

/// A manually logged pause within a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    /// When the break started.
    pub start_time: NaiveDateTime,
    /// When the break ended; `None` while it is in progress.
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

impl Break {
    /// Returns true while the break is in progress.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Returns the length of a closed break.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// One continuous attendance record from clock-in to clock-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier; prefixed with `offline_` until reconciled.
    #[serde(default)]
    pub id: String,
    /// The employee this shift belongs to.
    pub employee_id: String,
    /// Clock-in time.
    pub start_time: NaiveDateTime,
    /// Clock-out time; `None` while the shift is open.
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Manually logged breaks, oldest first.
    #[serde(default)]
    pub breaks: Vec<Break>,
    /// Free text notes.
    #[serde(default)]
    pub notes: String,
}

impl TimeEntry {
    /// Creates an open shift starting at `start_time`. The id is assigned on persistence.
    pub fn open(employee_id: impl Into<String>, start_time: NaiveDateTime) -> Self {
        Self {
            id: String::new(),
            employee_id: employee_id.into(),
            start_time,
            end_time: None,
            status: EntryStatus::Active,
            breaks: Vec::new(),
            notes: String::new(),
        }
    }

    /// Returns true while the shift has not been clocked out.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Returns true when the entry was created offline and not yet reconciled.
    pub fn is_offline(&self) -> bool {
        self.id.starts_with(OFFLINE_ENTRY_PREFIX)
    }

    /// Returns the break in progress, if any.
    pub fn open_break(&self) -> Option<&Break> {
        self.breaks.last().filter(|b| b.is_open())
    }

    /// Returns the attendance state this entry puts its employee in.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeclock_engine::models::{AttendanceState, TimeEntry};
    /// use chrono::NaiveDateTime;
    ///
    /// let start = NaiveDateTime::parse_from_str("2026-01-15 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    /// let entry = TimeEntry::open("emp_001", start);
    /// assert_eq!(entry.state(), AttendanceState::Active);
    /// ```
    pub fn state(&self) -> AttendanceState {
        if !self.is_open() {
            AttendanceState::Absent
        } else if self.open_break().is_some() {
            AttendanceState::OnBreak
        } else {
            AttendanceState::Active
        }
    }

    /// Appends an open break and marks the entry as on break.
    pub(crate) fn begin_break(&mut self, at: NaiveDateTime) {
        self.breaks.push(Break {
            start_time: at,
            end_time: None,
        });
        self.status = EntryStatus::OnBreak;
    }

    /// Closes the trailing break and marks the entry active again.
    pub(crate) fn finish_break(&mut self, at: NaiveDateTime) {
        if let Some(last) = self.breaks.last_mut().filter(|b| b.is_open()) {
            last.end_time = Some(at);
        }
        self.status = EntryStatus::Active;
    }

    /// Clocks the entry out. A break still in progress is closed at the same instant.
    pub(crate) fn close(&mut self, at: NaiveDateTime) {
        if let Some(last) = self.breaks.last_mut().filter(|b| b.is_open()) {
            last.end_time = Some(at);
        }
        self.end_time = Some(at);
        self.status = EntryStatus::Completed;
    }

    /// Status implied by the end time and the trailing break.
    pub(crate) fn derived_status(&self) -> EntryStatus {
        match self.state() {
            AttendanceState::Absent => EntryStatus::Completed,
            AttendanceState::OnBreak => EntryStatus::OnBreak,
            AttendanceState::Active => EntryStatus::Active,
        }
    }

    /// Checks the entry against the attendance invariants.
    ///
    /// Status must match the end time and the trailing break, only the last
    /// break may be open, breaks must be ordered and lie inside the shift, and
    /// every interval must end at or after its start.
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(self.invalid("end time is before start time"));
            }
        }

        if self.status != self.derived_status() {
            return Err(self.invalid(format!(
                "status {:?} does not match the recorded times",
                self.status
            )));
        }

        let mut previous_end = self.start_time;
        let last_index = self.breaks.len().saturating_sub(1);
        for (index, item) in self.breaks.iter().enumerate() {
            if item.start_time < previous_end {
                return Err(self.invalid(format!("break {} overlaps the previous interval", index + 1)));
            }
            match item.end_time {
                Some(break_end) => {
                    if break_end < item.start_time {
                        return Err(self.invalid(format!("break {} ends before it starts", index + 1)));
                    }
                    if let Some(end) = self.end_time {
                        if break_end > end {
                            return Err(self.invalid(format!(
                                "break {} ends after the shift",
                                index + 1
                            )));
                        }
                    }
                    previous_end = break_end;
                }
                None => {
                    if index != last_index {
                        return Err(self.invalid(format!("break {} is still open", index + 1)));
                    }
                    if self.end_time.is_some() {
                        return Err(self.invalid("a closed shift has a break in progress"));
                    }
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> EngineError {
        EngineError::InvalidEntry {
            entry_id: self.id.clone(),
            message: message.into(),
        }
    }
}
