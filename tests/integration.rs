//! End-to-end tests for the Payroll Engine HTTP API.
//!
//! Every test builds a fresh router over the sample facility configuration
//! and in-memory stores, then drives it with JSON requests:
//! - Profile and attendance upserts
//! - The Draft → Calculated → Locked lifecycle
//! - Failed lines blocking the lock
//! - Missing rate tables
//! - Reversals of locked lines
//! - Payslips and the CSV extract

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::run::PayrollOrchestrator;
use payroll_engine::store::{InMemoryAttendanceStore, InMemoryLedger, InMemoryProfileStore};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_router_for_test() -> Router {
    let loader = ConfigLoader::load("./config/facility").expect("Failed to load config");
    let orchestrator = PayrollOrchestrator::new(
        Arc::new(loader.config().clone()),
        Arc::new(InMemoryProfileStore::new()),
        Arc::new(InMemoryAttendanceStore::new()),
        Arc::new(InMemoryLedger::new()),
    );
    create_router(AppState::new(orchestrator))
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal fields are strings")).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn send_raw(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, text) = send_raw(router, method, uri, body).await;
    let json = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, json)
}

fn hourly_profile(employee_id: &str) -> Value {
    json!({
        "employee_id": employee_id,
        "name": "Kim Minji",
        "department": "Nursing",
        "position": "Care worker",
        "employment_type": "hourly",
        "base_wage": "12000",
        "overtime_premium_rate": "0.5",
        "night_premium_rate": "0.5",
        "insurance_enrollment": ["pension", "health", "long_term_care", "employment"],
        "tax_enrollment": ["income_tax", "local_tax"],
        "hire_date": "2020-03-01"
    })
}

fn attendance(employee_id: &str, month: &str, overtime_hours: &str) -> Value {
    json!({
        "employee_id": employee_id,
        "month": month,
        "work_days": 20,
        "regular_hours": "160",
        "overtime_hours": overtime_hours,
        "qualifies_for_weekly_rest_allowance": true
    })
}

async fn put_employee(router: &Router, employee_id: &str, month: &str) {
    let (status, _) = send(
        router,
        "PUT",
        &format!("/profiles/{}", employee_id),
        Some(hourly_profile(employee_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        router,
        "PUT",
        &format!("/attendance/{}/{}", month, employee_id),
        Some(attendance(employee_id, month, "10")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_run(router: &Router, month: &str) -> String {
    let (status, body) = send(router, "POST", "/runs", Some(json!({ "target_month": month }))).await;
    assert_eq!(status, StatusCode::CREATED, "create run failed: {}", body);
    body["header"]["run_id"].as_str().unwrap().to_string()
}

async fn calculate(router: &Router, run_id: &str) -> (StatusCode, Value) {
    send(router, "POST", &format!("/runs/{}/calculate", run_id), None).await
}

async fn lock(router: &Router, run_id: &str) -> (StatusCode, Value) {
    send(router, "POST", &format!("/runs/{}/lock", run_id), None).await
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_hourly_worked_example_end_to_end() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;

    let (status, run) = calculate(&router, &run_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["state"], "calculated");
    assert_eq!(run["summary"]["succeeded"], 1);
    assert_eq!(run["summary"]["failed"], 0);

    let (status, line) = send(&router, "GET", &format!("/runs/{}/lines/emp_001", run_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(line["status"], "calculated");
    assert_eq!(decimal(&line["earnings"]["base_pay"]["amount"]), dec("1920000"));
    assert_eq!(decimal(&line["earnings"]["overtime_pay"]["amount"]), dec("180000"));
    assert_eq!(
        decimal(&line["earnings"]["weekly_rest_allowance"]["amount"]),
        dec("420000")
    );
    assert_eq!(decimal(&line["total_pay"]), dec("2520000"));
    assert_eq!(decimal(&line["deductions"]["pension"]), dec("113400"));

    let net = decimal(&line["net_pay"]);
    let total_pay = decimal(&line["total_pay"]);
    let total_deduction = decimal(&line["total_deduction"]);
    assert_eq!(net, total_pay - total_deduction);
}

#[tokio::test]
async fn test_lock_exports_and_second_lock_is_reported() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;
    calculate(&router, &run_id).await;

    let (status, first) = lock(&router, &run_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["outcome"], "locked");
    assert_eq!(first["run"]["export"]["employee_count"], 1);
    let reference = first["run"]["receipt"]["ledger_reference"].clone();
    assert!(reference.is_string());

    let (status, second) = lock(&router, &run_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["outcome"], "already_locked");
    assert_eq!(second["run"]["receipt"]["ledger_reference"], reference);

    let (_, run) = send(&router, "GET", &format!("/runs/{}", run_id), None).await;
    assert_eq!(run["state"], "locked");
}

#[tokio::test]
async fn test_locked_run_rejects_reopen_and_recalculation() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;
    calculate(&router, &run_id).await;
    lock(&router, &run_id).await;

    let (status, body) = send(&router, "POST", &format!("/runs/{}/reopen", run_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, body) = calculate(&router, &run_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_draft_run_cannot_be_locked() {
    let router = create_router_for_test();
    let run_id = create_run(&router, "2026-01").await;

    let (status, body) = lock(&router, &run_id).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_duplicate_month_is_rejected() {
    let router = create_router_for_test();
    create_run(&router, "2026-01").await;

    let (status, body) = send(
        &router,
        "POST",
        "/runs",
        Some(json!({ "target_month": "2026-01" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "RUN_ALREADY_EXISTS");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_rate_table_keeps_run_in_draft() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2024-06").await;
    let run_id = create_run(&router, "2024-06").await;

    let (status, body) = calculate(&router, &run_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MISSING_RATE_TABLE");

    let (_, run) = send(&router, "GET", &format!("/runs/{}", run_id), None).await;
    assert_eq!(run["state"], "draft");
}

#[tokio::test]
async fn test_missing_attendance_fails_line_and_blocks_lock() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    send(
        &router,
        "PUT",
        "/profiles/emp_002",
        Some(hourly_profile("emp_002")),
    )
    .await;
    let run_id = create_run(&router, "2026-01").await;

    let (_, run) = calculate(&router, &run_id).await;
    assert_eq!(run["summary"]["succeeded"], 1);
    assert_eq!(run["summary"]["failed"], 1);
    assert_eq!(run["lines"]["emp_002"]["status"], "failed");
    assert_eq!(run["lines"]["emp_002"]["error_code"], "ATTENDANCE_NOT_FOUND");

    let (status, body) = lock(&router, &run_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "LOCK_BLOCKED");

    send(
        &router,
        "PUT",
        "/attendance/2026-01/emp_002",
        Some(attendance("emp_002", "2026-01", "0")),
    )
    .await;
    let (status, run) = send(&router, "POST", &format!("/runs/{}/reopen", run_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["state"], "draft");

    let (_, run) = calculate(&router, &run_id).await;
    assert_eq!(run["summary"]["failed"], 0);
    let (status, outcome) = lock(&router, &run_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["run"]["export"]["employee_count"], 2);
}

#[tokio::test]
async fn test_negative_hours_fail_only_that_line() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    send(
        &router,
        "PUT",
        "/profiles/emp_002",
        Some(hourly_profile("emp_002")),
    )
    .await;
    let (status, _) = send(
        &router,
        "PUT",
        "/attendance/2026-01/emp_002",
        Some(attendance("emp_002", "2026-01", "-2")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let run_id = create_run(&router, "2026-01").await;

    let (_, run) = calculate(&router, &run_id).await;

    assert_eq!(run["lines"]["emp_001"]["status"], "calculated");
    assert_eq!(run["lines"]["emp_002"]["status"], "failed");
    assert_eq!(run["lines"]["emp_002"]["error_code"], "INVALID_ATTENDANCE");
}

#[tokio::test]
async fn test_acknowledging_a_healthy_line_is_rejected() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;
    calculate(&router, &run_id).await;

    let (status, body) = send(
        &router,
        "POST",
        &format!("/runs/{}/acknowledgements", run_id),
        Some(json!({ "employee_id": "emp_001", "acknowledged_by": "hr_admin" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NOTHING_TO_ACKNOWLEDGE");
}

// =============================================================================
// Reversals
// =============================================================================

#[tokio::test]
async fn test_reversal_of_locked_line_is_exported_with_next_run() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let january = create_run(&router, "2026-01").await;
    calculate(&router, &january).await;
    lock(&router, &january).await;

    send(
        &router,
        "PUT",
        "/attendance/2026-02/emp_001",
        Some(attendance("emp_001", "2026-02", "0")),
    )
    .await;
    let february = create_run(&router, "2026-02").await;

    let (status, run) = send(
        &router,
        "POST",
        &format!("/runs/{}/reversals", february),
        Some(json!({ "source_run_id": january, "employee_id": "emp_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["reversals"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&run["reversals"][0]["gross_pay"]), dec("-2520000"));

    let (status, body) = send(
        &router,
        "POST",
        &format!("/runs/{}/reversals", february),
        Some(json!({ "source_run_id": january, "employee_id": "emp_001" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_REVERSAL");

    calculate(&router, &february).await;
    let (status, outcome) = lock(&router, &february).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["run"]["export"]["reversal_count"], 1);
}

#[tokio::test]
async fn test_reversal_requires_locked_source() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let january = create_run(&router, "2026-01").await;
    calculate(&router, &january).await;
    let february = create_run(&router, "2026-02").await;

    let (status, body) = send(
        &router,
        "POST",
        &format!("/runs/{}/reversals", february),
        Some(json!({ "source_run_id": january, "employee_id": "emp_001" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_REVERSAL");
}

// =============================================================================
// Projections
// =============================================================================

#[tokio::test]
async fn test_payslip_lists_components_in_order() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;
    calculate(&router, &run_id).await;

    let (status, payslip) = send(
        &router,
        "GET",
        &format!("/runs/{}/payslips/emp_001", run_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payslip["run_state"], "calculated");
    assert_eq!(payslip["employee"]["name"], "Kim Minji");
    assert_eq!(payslip["earnings"][0]["code"], "base_pay");
    assert_eq!(payslip["earnings"][3]["code"], "weekly_rest_allowance");
    assert_eq!(payslip["deductions"][5]["code"], "local_tax");
    assert_eq!(decimal(&payslip["total_pay"]), dec("2520000"));
}

#[tokio::test]
async fn test_payslip_for_unknown_employee_returns_404() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;
    calculate(&router, &run_id).await;

    let (status, body) = send(
        &router,
        "GET",
        &format!("/runs/{}/payslips/emp_404", run_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "LINE_NOT_FOUND");
}

#[tokio::test]
async fn test_extract_is_served_as_csv() {
    let router = create_router_for_test();
    put_employee(&router, "emp_001", "2026-01").await;
    put_employee(&router, "emp_002", "2026-01").await;
    let run_id = create_run(&router, "2026-01").await;
    calculate(&router, &run_id).await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/runs/{}/extract", run_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("target_month,employee_id"));
    assert!(rows[1].starts_with("2026-01,emp_001"));
    assert!(rows[2].starts_with("2026-01,emp_002"));
}

#[tokio::test]
async fn test_extract_of_draft_run_is_rejected() {
    let router = create_router_for_test();
    let run_id = create_run(&router, "2026-01").await;

    let (status, text) = send_raw(&router, "GET", &format!("/runs/{}/extract", run_id), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(text.contains("INVALID_TRANSITION"));
}
