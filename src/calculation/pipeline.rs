//! Per-employee calculation pipeline.
//!
//! Runs the allowance calculator, the deduction calculator and the
//! aggregator for one employee, turning any per-employee error into a
//! failed line.

use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{aggregate_line, calculate_allowances, calculate_deductions};
use crate::config::StatutoryRateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceFacts, CompensationProfile, FailedLine, LineOutcome, PayMonth, PayrollLineResult,
};

/// Calculates one employee's line for a month.
///
/// Missing or invalid attendance and invalid profiles produce a
/// [`LineOutcome::Failed`] carrying the error code and message; they never
/// abort the caller.
pub fn calculate_employee(
    run_id: Uuid,
    profile: &CompensationProfile,
    attendance: Option<&AttendanceFacts>,
    month: PayMonth,
    table: &StatutoryRateTable,
) -> LineOutcome {
    let start = Instant::now();

    match try_calculate(run_id, profile, attendance, month, table) {
        Ok(line) => {
            debug!(
                run_id = %run_id,
                employee_id = %profile.employee_id,
                net_pay = %line.net_pay,
                duration_us = start.elapsed().as_micros() as u64,
                "Calculated payroll line"
            );
            LineOutcome::Calculated(line)
        }
        Err(error) => {
            warn!(
                run_id = %run_id,
                employee_id = %profile.employee_id,
                error_code = error.code(),
                error = %error,
                "Payroll line failed"
            );
            LineOutcome::Failed(FailedLine::of(profile, &error))
        }
    }
}

fn try_calculate(
    run_id: Uuid,
    profile: &CompensationProfile,
    attendance: Option<&AttendanceFacts>,
    month: PayMonth,
    table: &StatutoryRateTable,
) -> EngineResult<PayrollLineResult> {
    let attendance = attendance.ok_or_else(|| EngineError::AttendanceNotFound {
        employee_id: profile.employee_id.clone(),
        month,
    })?;

    let allowances = calculate_allowances(profile, attendance, &table.policy, month, 1)?;
    let next_step = allowances.audit_steps.len() as u32 + 1;
    let deductions = calculate_deductions(profile, &allowances.earnings, table, next_step);

    Ok(aggregate_line(
        run_id,
        profile,
        attendance,
        allowances,
        deductions,
    ))
}
