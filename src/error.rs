//! Error types for the time-clock engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the attendance engine, the storage adapters and the
//! reconciliation queue can report.

use thiserror::Error;

use crate::models::{AttendanceState, Operation};

/// The main error type for the time-clock engine.
///
/// State-machine and validation errors are returned to the immediate caller.
/// Connectivity errors (`Disconnected`) are normally absorbed by the offline
/// queue and only surface from explicit administrative actions.
///
/// # Example
///
/// ```
/// use timeclock_engine::error::EngineError;
///
/// let error = EngineError::UnknownTag {
///     tag_uid: "04a2b9c1".to_string(),
/// };
/// assert_eq!(error.to_string(), "Badge not recognized: 04a2b9c1");
/// ```
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The requested operation is not allowed in the employee's current state.
    #[error("Invalid transition for employee '{employee_id}': cannot {operation} while {state}")]
    InvalidTransition {
        /// The employee the operation was requested for.
        employee_id: String,
        /// The attendance state the employee was in.
        state: AttendanceState,
        /// The rejected operation.
        operation: Operation,
    },

    /// A scanned tag is not bound to any employee.
    #[error("Badge not recognized: {tag_uid}")]
    UnknownTag {
        /// The normalized tag identifier.
        tag_uid: String,
    },

    /// No employee exists with the given id.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The id that was looked up.
        employee_id: String,
    },

    /// No time entry exists with the given id.
    #[error("Time entry not found: {entry_id}")]
    EntryNotFound {
        /// The id that was looked up.
        entry_id: String,
    },

    /// A storage update targeted a document that does not exist.
    #[error("Document '{id}' not found in collection '{collection}'")]
    DocumentNotFound {
        /// The collection that was written to.
        collection: String,
        /// The missing document id.
        id: String,
    },

    /// The tag is already bound to a different employee.
    #[error("Tag '{tag_uid}' is already bound to employee '{employee_id}'")]
    TagAlreadyBound {
        /// The tag identifier.
        tag_uid: String,
        /// The employee currently holding the tag.
        employee_id: String,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A time entry would violate the attendance invariants.
    #[error("Invalid time entry '{entry_id}': {message}")]
    InvalidEntry {
        /// The id of the offending entry.
        entry_id: String,
        /// A description of the violated invariant.
        message: String,
    },

    /// The remote store could not be reached.
    #[error("Remote store unreachable: {message}")]
    Disconnected {
        /// Details from the storage adapter.
        message: String,
    },

    /// A bounded wait expired.
    #[error("Timed out after {seconds}s waiting for {operation}")]
    Timeout {
        /// What was being waited for.
        operation: String,
        /// The configured wait in seconds.
        seconds: u64,
    },

    /// A pending tag registration was replaced by a newer one.
    #[error("Tag registration for employee '{employee_id}' was cancelled")]
    RegistrationCancelled {
        /// The employee whose registration was cancelled.
        employee_id: String,
    },

    /// The reconciliation batch could not be committed; the queue is retained.
    #[error("Reconciliation failed: {message}")]
    ReconciliationFailure {
        /// Why the batch failed.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A storage back-end failed for a reason other than connectivity.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true when the error means the remote store is unreachable.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, EngineError::Disconnected { .. })
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        EngineError::Storage {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::storage(format!("document serialization failed: {error}"))
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
