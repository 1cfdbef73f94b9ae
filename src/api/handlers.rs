//! HTTP request handlers for the Payroll Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::export::{PayslipView, extract_rows, render_csv};
use crate::models::{AttendanceFacts, CompensationProfile, PayMonth};

use super::request::{AcknowledgeRequest, CreateRunRequest, ReversalRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/profiles/:employee_id",
            get(get_profile_handler).put(upsert_profile_handler),
        )
        .route(
            "/attendance/:month/:employee_id",
            put(upsert_attendance_handler),
        )
        .route("/runs", post(create_run_handler))
        .route("/runs/:run_id", get(get_run_handler))
        .route("/runs/:run_id/calculate", post(calculate_handler))
        .route("/runs/:run_id/reopen", post(reopen_handler))
        .route("/runs/:run_id/acknowledgements", post(acknowledge_handler))
        .route("/runs/:run_id/reversals", post(reversal_handler))
        .route("/runs/:run_id/lock", post(lock_handler))
        .route("/runs/:run_id/lines/:employee_id", get(line_handler))
        .route("/runs/:run_id/payslips/:employee_id", get(payslip_handler))
        .route("/runs/:run_id/extract", get(extract_handler))
        .with_state(state)
}

/// Unwraps a JSON body, turning serde and content-type rejections into 400s.
fn json_body<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
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
            Err(ApiErrorResponse::bad_request(error))
        }
    }
}

fn parse_run_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::validation_error(format!(
            "Invalid run id '{}': expected a UUID",
            raw
        )))
    })
}

fn parse_month(raw: &str) -> ApiResult<PayMonth> {
    raw.parse::<PayMonth>().map_err(ApiErrorResponse::from)
}

/// Logs an engine failure against the request and converts it.
fn failed(correlation_id: Uuid, error: EngineError) -> ApiErrorResponse {
    warn!(
        correlation_id = %correlation_id,
        code = error.code(),
        error = %error,
        "Request failed"
    );
    error.into()
}

/// Handler for `GET /profiles/:employee_id`.
async fn get_profile_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> ApiResult<Json<CompensationProfile>> {
    let correlation_id = Uuid::new_v4();
    let profile = state
        .orchestrator()
        .profiles()
        .get_profile(&employee_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    profile.map(Json).ok_or_else(|| {
        failed(
            correlation_id,
            EngineError::ProfileNotFound { employee_id },
        )
    })
}

/// Handler for `PUT /profiles/:employee_id`.
///
/// The path id must match the body's `employee_id`.
async fn upsert_profile_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<CompensationProfile>, JsonRejection>,
) -> ApiResult<Json<CompensationProfile>> {
    let correlation_id = Uuid::new_v4();
    let profile = json_body(payload, correlation_id)?;
    if profile.employee_id != employee_id {
        return Err(ApiErrorResponse::bad_request(ApiError::validation_error(
            format!(
                "Path employee '{}' does not match body employee '{}'",
                employee_id, profile.employee_id
            ),
        )));
    }

    state
        .orchestrator()
        .profiles()
        .upsert_profile(profile.clone())
        .await
        .map_err(|e| failed(correlation_id, e))?;
    info!(correlation_id = %correlation_id, employee_id = %employee_id, "Upserted profile");
    Ok(Json(profile))
}

/// Handler for `PUT /attendance/:month/:employee_id`.
///
/// Facts are stored as received; malformed values surface as failed lines
/// when the run is calculated.
async fn upsert_attendance_handler(
    State(state): State<AppState>,
    Path((month, employee_id)): Path<(String, String)>,
    payload: Result<Json<AttendanceFacts>, JsonRejection>,
) -> ApiResult<Json<AttendanceFacts>> {
    let correlation_id = Uuid::new_v4();
    let month = parse_month(&month)?;
    let facts = json_body(payload, correlation_id)?;
    if facts.employee_id != employee_id || facts.month != month {
        return Err(ApiErrorResponse::bad_request(ApiError::validation_error(
            format!(
                "Path ({}, {}) does not match body ({}, {})",
                month, employee_id, facts.month, facts.employee_id
            ),
        )));
    }

    state
        .orchestrator()
        .attendance()
        .upsert_attendance(facts.clone())
        .await
        .map_err(|e| failed(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        month = %month,
        "Upserted attendance"
    );
    Ok(Json(facts))
}

/// Handler for `POST /runs`.
async fn create_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRunRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        target_month = %request.target_month,
        "Creating payroll run"
    );

    let run = state
        .orchestrator()
        .create_run(request.target_month)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok((StatusCode::CREATED, Json(run)).into_response())
}

/// Handler for `GET /runs/:run_id`.
async fn get_run_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let run = state
        .orchestrator()
        .get_run(run_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(run).into_response())
}

/// Handler for `POST /runs/:run_id/calculate`.
async fn calculate_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    info!(correlation_id = %correlation_id, run_id = %run_id, "Processing calculation request");

    let start_time = Instant::now();
    let run = state
        .orchestrator()
        .calculate(run_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        duration_us = start_time.elapsed().as_micros(),
        "Calculation request completed"
    );
    Ok(Json(run).into_response())
}

/// Handler for `POST /runs/:run_id/reopen`.
async fn reopen_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let run = state
        .orchestrator()
        .reopen(run_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(run).into_response())
}

/// Handler for `POST /runs/:run_id/acknowledgements`.
async fn acknowledge_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    payload: Result<Json<AcknowledgeRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let request = json_body(payload, correlation_id)?;
    let line = state
        .orchestrator()
        .acknowledge(run_id, &request.employee_id, &request.acknowledged_by)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(line).into_response())
}

/// Handler for `POST /runs/:run_id/reversals`.
async fn reversal_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    payload: Result<Json<ReversalRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let request = json_body(payload, correlation_id)?;
    let run = state
        .orchestrator()
        .add_reversal(run_id, request.source_run_id, &request.employee_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(run).into_response())
}

/// Handler for `POST /runs/:run_id/lock`.
///
/// Locking an already locked run answers 200 with an `already_locked`
/// outcome and exports nothing.
async fn lock_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    info!(correlation_id = %correlation_id, run_id = %run_id, "Processing lock request");
    let outcome = state
        .orchestrator()
        .lock(run_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(outcome).into_response())
}

/// Handler for `GET /runs/:run_id/lines/:employee_id`.
async fn line_handler(
    State(state): State<AppState>,
    Path((run_id, employee_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let line = state
        .orchestrator()
        .line(run_id, &employee_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(line).into_response())
}

/// Handler for `GET /runs/:run_id/payslips/:employee_id`.
async fn payslip_handler(
    State(state): State<AppState>,
    Path((run_id, employee_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let run = state
        .orchestrator()
        .get_run(run_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    let payslip =
        PayslipView::build(&run, &employee_id).map_err(|e| failed(correlation_id, e))?;
    Ok(Json(payslip).into_response())
}

/// Handler for `GET /runs/:run_id/extract`, answered as CSV.
async fn extract_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    let run_id = parse_run_id(&run_id)?;
    let run = state
        .orchestrator()
        .get_run(run_id)
        .await
        .map_err(|e| failed(correlation_id, e))?;
    let rows = extract_rows(&run).map_err(|e| failed(correlation_id, e))?;
    let csv = render_csv(&rows).map_err(|e| failed(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        row_count = rows.len(),
        "Rendered monthly extract"
    );
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    )
        .into_response())
}
