//! Request types for the time-clock API.
//!
//! Bodies for the employee and entry endpoints reuse the model types
//! ([`NewEmployee`](crate::models::NewEmployee),
//! [`EmployeeUpdate`](crate::models::EmployeeUpdate),
//! [`EntryEdit`](crate::engine::EntryEdit)); the types below cover the rest.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::ReportPeriod;

use super::response::ApiError;

/// Optional `?at=` override of the operation time.
///
/// Clock operations default to the server's local time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimestampQuery {
    /// Operation time, `YYYY-MM-DDTHH:MM:SS`.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

impl TimestampQuery {
    /// The requested time, or now.
    pub fn resolve(&self) -> NaiveDateTime {
        self.at.unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Request body for `POST /scan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// The tag identifier as read from the card.
    pub tag_uid: String,
    /// When the tap happened; defaults to now.
    #[serde(default)]
    pub scanned_at: Option<NaiveDateTime>,
}

/// Request body for `POST /tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindTagRequest {
    /// The employee to bind.
    pub employee_id: String,
    /// The tag identifier.
    pub tag_uid: String,
}

/// Query string selecting a reporting window.
///
/// `period` is one of `today`, `week`, `month`, `all` or `custom`; a custom
/// period needs `start` and `end`. Giving `start` and `end` without a
/// period implies `custom`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodQuery {
    /// Named period.
    #[serde(default)]
    pub period: Option<String>,
    /// First day of a custom period.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last day of a custom period.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Restricts entries to one employee.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Reference time for relative periods; defaults to now.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

impl PeriodQuery {
    /// Reference time for relative periods.
    pub fn now(&self) -> NaiveDateTime {
        self.at.unwrap_or_else(|| Local::now().naive_local())
    }

    /// Resolves the requested period, using `default` when none is named.
    pub fn period_or(&self, default: ReportPeriod) -> Result<ReportPeriod, ApiError> {
        match self.period.as_deref() {
            None if self.start.is_some() || self.end.is_some() => self.custom(),
            None => Ok(default),
            Some("today") => Ok(ReportPeriod::Today),
            Some("week") => Ok(ReportPeriod::Week),
            Some("month") => Ok(ReportPeriod::Month),
            Some("all") => Ok(ReportPeriod::All),
            Some("custom") => self.custom(),
            Some(other) => Err(ApiError::validation_error(format!(
                "unknown period '{}', expected today, week, month, all or custom",
                other
            ))),
        }
    }

    fn custom(&self) -> Result<ReportPeriod, ApiError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Ok(ReportPeriod::Custom { start, end }),
            (Some(_), Some(_)) => Err(ApiError::validation_error("start must not be after end")),
            _ => Err(ApiError::validation_error(
                "a custom period needs both start and end",
            )),
        }
    }
}
