//! HTTP request handlers for the time-clock API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::EntryEdit;
use crate::error::EngineError;
use crate::models::{EmployeeUpdate, NewEmployee, ReportPeriod, ScanDisposition, ScanEvent, TagBinding};

use super::request::{BindTagRequest, PeriodQuery, ScanRequest, TimestampQuery};
use super::response::{ApiError, ApiErrorResponse, HealthResponse, ScanResponse, StatusResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/employees", get(list_employees_handler).post(create_employee_handler))
        .route(
            "/employees/:id",
            get(get_employee_handler)
                .put(update_employee_handler)
                .delete(delete_employee_handler),
        )
        .route("/employees/:id/stats", get(employee_stats_handler))
        .route("/clock-in/:employee_id", post(clock_in_handler))
        .route("/clock-out/:employee_id", post(clock_out_handler))
        .route("/start-break/:employee_id", post(start_break_handler))
        .route("/end-break/:employee_id", post(end_break_handler))
        .route("/status/:employee_id", get(status_handler))
        .route("/scan", post(scan_handler))
        .route("/tags", get(export_tags_handler).post(bind_tag_handler))
        .route("/tags/import", post(import_tags_handler))
        .route("/tags/register/:employee_id", post(register_tag_handler))
        .route("/tags/:tag_uid", delete(unbind_tag_handler))
        .route("/time-entries", get(list_entries_handler))
        .route(
            "/time-entries/:id",
            put(edit_entry_handler).delete(delete_entry_handler),
        )
        .route("/register", get(register_handler))
        .route("/stats", get(weekly_stats_handler))
        .route("/sync/status", get(sync_status_handler))
        .route("/sync", post(sync_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], Json(body)).into_response()
}

fn error_response(correlation_id: Uuid, error: EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %error, "Request failed");
    ApiErrorResponse::from(error).into_response()
}

/// Unwraps a JSON body, turning extractor rejections into 400 responses.
fn parse_body<T: DeserializeOwned>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error).into_response())
}

fn resolve_period(
    correlation_id: Uuid,
    query: &PeriodQuery,
    default: ReportPeriod,
) -> Result<ReportPeriod, Response> {
    query.period_or(default).map_err(|error| {
        warn!(correlation_id = %correlation_id, error = %error.message, "Invalid period");
        ApiErrorResponse::bad_request(error).into_response()
    })
}

/// Handler for GET /health.
async fn health_handler(State(state): State<AppState>) -> Response {
    let engine = state.engine();
    let pending_sync = match engine.sync_status().await {
        Ok(status) => status.pending,
        Err(error) => return error_response(Uuid::new_v4(), error),
    };
    let company = &state.config().settings().company;
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok".to_string(),
            company: company.name.clone(),
            currency: company.currency.clone(),
            remote_connected: engine.is_connected().await,
            pending_sync,
        },
    )
}

// ---- employees ----

async fn list_employees_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.engine().directory().list_employees())
}

async fn create_employee_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Creating employee");
    let new = match parse_body(correlation_id, payload) {
        Ok(new) => new,
        Err(response) => return response,
    };

    match state.engine().create_employee(new).await {
        Ok(employee) => {
            info!(correlation_id = %correlation_id, employee_id = %employee.id, "Employee created");
            json_response(StatusCode::CREATED, employee)
        }
        Err(error) => error_response(correlation_id, error),
    }
}

async fn get_employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.engine().directory().get_employee(&id) {
        Ok(employee) => json_response(StatusCode::OK, employee),
        Err(error) => error_response(Uuid::new_v4(), error),
    }
}

async fn update_employee_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EmployeeUpdate>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let update = match parse_body(correlation_id, payload) {
        Ok(update) => update,
        Err(response) => return response,
    };

    match state.engine().update_employee(&id, &update).await {
        Ok(employee) => {
            info!(correlation_id = %correlation_id, employee_id = %id, "Employee updated");
            json_response(StatusCode::OK, employee)
        }
        Err(error) => error_response(correlation_id, error),
    }
}

async fn delete_employee_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.engine().delete_employee(&id).await {
        Ok(()) => {
            info!(correlation_id = %correlation_id, employee_id = %id, "Employee deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => error_response(correlation_id, error),
    }
}

async fn employee_stats_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period = match resolve_period(correlation_id, &query, ReportPeriod::Week) {
        Ok(period) => period,
        Err(response) => return response,
    };

    match state.engine().employee_stats(&id, period, query.now()) {
        Ok(stats) => json_response(StatusCode::OK, stats),
        Err(error) => error_response(correlation_id, error),
    }
}

// ---- attendance ----

async fn clock_in_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Query(query): Query<TimestampQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Processing clock-in");
    match state.engine().clock_in(&employee_id, query.resolve()).await {
        Ok(entry) => json_response(StatusCode::CREATED, entry),
        Err(error) => error_response(correlation_id, error),
    }
}

async fn clock_out_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Query(query): Query<TimestampQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Processing clock-out");
    match state.engine().clock_out(&employee_id, query.resolve()).await {
        Ok(entry) => json_response(StatusCode::OK, entry),
        Err(error) => error_response(correlation_id, error),
    }
}

async fn start_break_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Query(query): Query<TimestampQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Processing break start");
    match state.engine().start_break(&employee_id, query.resolve()).await {
        Ok(entry) => json_response(StatusCode::OK, entry),
        Err(error) => error_response(correlation_id, error),
    }
}

async fn end_break_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Query(query): Query<TimestampQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Processing break end");
    match state.engine().end_break(&employee_id, query.resolve()).await {
        Ok(entry) => json_response(StatusCode::OK, entry),
        Err(error) => error_response(correlation_id, error),
    }
}

async fn status_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Response {
    let engine = state.engine();
    match engine.current_state(&employee_id) {
        Ok(attendance) => json_response(
            StatusCode::OK,
            StatusResponse {
                open_entry: engine.open_entry(&employee_id),
                employee_id,
                state: attendance,
            },
        ),
        Err(error) => error_response(Uuid::new_v4(), error),
    }
}

/// Handler for POST /scan.
///
/// A scan completes a pending tag registration when there is one;
/// otherwise it toggles the attendance of the badge's employee.
async fn scan_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, tag_uid = %request.tag_uid, "Processing scan");

    let scan = ScanEvent {
        scanned_at: TimestampQuery {
            at: request.scanned_at,
        }
        .resolve(),
        tag_uid: request.tag_uid,
    };
    match state.engine().handle_scan(scan).await {
        Ok(ScanDisposition::Attendance(outcome)) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %outcome.employee_id,
                action = outcome.action.as_str(),
                "Scan processed"
            );
            json_response(
                StatusCode::OK,
                ScanResponse {
                    employee_id: outcome.employee_id,
                    action: outcome.action,
                    employee: outcome.employee,
                },
            )
        }
        Ok(ScanDisposition::Registration(binding)) => json_response(StatusCode::CREATED, binding),
        Err(error) => error_response(correlation_id, error),
    }
}

// ---- tags ----

async fn register_tag_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Waiting for tag registration scan");
    match state.engine().register_tag(&employee_id).await {
        Ok(binding) => json_response(StatusCode::CREATED, binding),
        Err(error) => error_response(correlation_id, error),
    }
}

async fn bind_tag_handler(
    State(state): State<AppState>,
    payload: Result<Json<BindTagRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let now = TimestampQuery::default().resolve();
    match state
        .engine()
        .bind_tag(&request.employee_id, &request.tag_uid, now)
        .await
    {
        Ok(binding) => json_response(StatusCode::CREATED, binding),
        Err(error) => error_response(correlation_id, error),
    }
}

async fn unbind_tag_handler(State(state): State<AppState>, Path(tag_uid): Path<String>) -> Response {
    match state.engine().unbind_tag(&tag_uid).await {
        Ok(binding) => json_response(StatusCode::OK, binding),
        Err(error) => error_response(Uuid::new_v4(), error),
    }
}

async fn export_tags_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.engine().export_tag_bindings())
}

async fn import_tags_handler(
    State(state): State<AppState>,
    payload: Result<Json<Vec<TagBinding>>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let bindings = match parse_body(correlation_id, payload) {
        Ok(bindings) => bindings,
        Err(response) => return response,
    };

    match state.engine().import_tag_bindings(bindings).await {
        Ok(imported) => json_response(StatusCode::OK, serde_json::json!({ "imported": imported })),
        Err(error) => error_response(correlation_id, error),
    }
}

// ---- time entries and reports ----

async fn list_entries_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period = match resolve_period(correlation_id, &query, ReportPeriod::All) {
        Ok(period) => period,
        Err(response) => return response,
    };
    let entries = state
        .engine()
        .filter_entries(query.employee_id.as_deref(), period, query.now());
    json_response(StatusCode::OK, entries)
}

async fn edit_entry_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EntryEdit>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let edit = match parse_body(correlation_id, payload) {
        Ok(edit) => edit,
        Err(response) => return response,
    };

    match state.engine().edit_entry(&id, edit).await {
        Ok(entry) => {
            info!(correlation_id = %correlation_id, entry_id = %id, "Time entry edited");
            json_response(StatusCode::OK, entry)
        }
        Err(error) => error_response(correlation_id, error),
    }
}

async fn delete_entry_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.engine().delete_entry(&id).await {
        Ok(()) => {
            info!(correlation_id = %correlation_id, entry_id = %id, "Time entry deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => error_response(correlation_id, error),
    }
}

async fn register_handler(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let period = match resolve_period(correlation_id, &query, ReportPeriod::All) {
        Ok(period) => period,
        Err(response) => return response,
    };
    let rows = state
        .engine()
        .register(query.employee_id.as_deref(), period, query.now());
    json_response(StatusCode::OK, rows)
}

async fn weekly_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<TimestampQuery>,
) -> Response {
    json_response(StatusCode::OK, state.engine().weekly_stats(query.resolve()))
}

// ---- sync ----

async fn sync_status_handler(State(state): State<AppState>) -> Response {
    match state.engine().sync_status().await {
        Ok(status) => json_response(StatusCode::OK, status),
        Err(error) => error_response(Uuid::new_v4(), error),
    }
}

/// Handler for POST /sync.
///
/// Runs reconciliation now and reports a failed batch as 503 instead of
/// leaving it to the next connectivity change.
async fn sync_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Manual reconciliation requested");
    match state.engine().reconcile().await {
        Ok(report) => {
            info!(
                correlation_id = %correlation_id,
                created_entries = report.created_entries,
                created_employees = report.created_employees,
                replayed_updates = report.replayed_updates,
                "Manual reconciliation finished"
            );
            json_response(StatusCode::OK, report)
        }
        Err(error) => error_response(correlation_id, error),
    }
}
