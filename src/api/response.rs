//! Response types for the time-clock API.
//!
//! This module defines the response bodies and the mapping from engine
//! errors to HTTP statuses.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{AttendanceState, ClockAction, Employee, TimeEntry};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with the given body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            EngineError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            EngineError::TagAlreadyBound { .. } => (StatusCode::CONFLICT, "TAG_ALREADY_BOUND"),
            EngineError::RegistrationCancelled { .. } => {
                (StatusCode::CONFLICT, "REGISTRATION_CANCELLED")
            }
            EngineError::UnknownTag { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_TAG"),
            EngineError::EmployeeNotFound { .. } => (StatusCode::NOT_FOUND, "EMPLOYEE_NOT_FOUND"),
            EngineError::EntryNotFound { .. } => (StatusCode::NOT_FOUND, "ENTRY_NOT_FOUND"),
            EngineError::DocumentNotFound { .. } => (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND"),
            EngineError::Timeout { .. } => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            EngineError::Disconnected { .. } => (StatusCode::SERVICE_UNAVAILABLE, "DISCONNECTED"),
            EngineError::ReconciliationFailure { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "RECONCILIATION_FAILED")
            }
            EngineError::InvalidEntry { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ENTRY"),
            EngineError::InvalidEmployee { .. } => (StatusCode::BAD_REQUEST, "INVALID_EMPLOYEE"),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            EngineError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        let error = match error {
            EngineError::Disconnected { .. } => ApiError::with_details(
                code,
                message,
                "The change needs the remote store; retry once the connection is back",
            ),
            EngineError::ReconciliationFailure { .. } => ApiError::with_details(
                code,
                message,
                "Offline changes were kept and will be sent on the next attempt",
            ),
            _ => ApiError::new(code, message),
        };
        ApiErrorResponse { status, error }
    }
}

/// Response body of `POST /scan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    /// The resolved employee id.
    pub employee_id: String,
    /// Whether the tap clocked the employee in or out.
    pub action: ClockAction,
    /// The resolved employee.
    pub employee: Employee,
}

/// Response body of `GET /status/:employee_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The employee.
    pub employee_id: String,
    /// Current attendance state.
    pub state: AttendanceState,
    /// The open shift, if any.
    pub open_entry: Option<TimeEntry>,
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Company name from the settings.
    pub company: String,
    /// Currency salary estimates are expressed in.
    pub currency: String,
    /// Whether the remote store is reachable.
    pub remote_connected: bool,
    /// Offline records and updates waiting for reconciliation.
    pub pending_sync: usize,
}
