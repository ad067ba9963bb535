//! HTTP API module for the time-clock engine.
//!
//! This module exposes the attendance engine over REST: employee
//! administration, clock operations, badge scans and tag registration,
//! time entry corrections, reports and manual reconciliation.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{BindTagRequest, PeriodQuery, ScanRequest, TimestampQuery};
pub use response::{ApiError, ApiErrorResponse, HealthResponse, ScanResponse, StatusResponse};
pub use state::AppState;
