//! Payroll line aggregation.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::{AllowanceBreakdown, DeductionBreakdown};
use crate::models::{
    AttendanceFacts, AuditStep, CompensationProfile, NegativeNetPayWarning, PayrollLineResult,
};

/// Assembles one employee's payroll line.
///
/// `net_pay` is never clamped: a negative value is kept and flagged with an
/// unacknowledged [`NegativeNetPayWarning`].
pub fn aggregate_line(
    run_id: Uuid,
    profile: &CompensationProfile,
    attendance: &AttendanceFacts,
    allowances: AllowanceBreakdown,
    deductions: DeductionBreakdown,
) -> PayrollLineResult {
    let total_pay = allowances.total_pay;
    let total_deduction = deductions.total_deduction;
    let net_pay = total_pay - total_deduction;

    let negative_net_pay = (net_pay < Decimal::ZERO).then_some(NegativeNetPayWarning {
        net_pay,
        acknowledgement: None,
    });

    let mut audit_trace = allowances.audit_steps;
    audit_trace.extend(deductions.audit_steps);

    let step_number = audit_trace.last().map_or(1, |s| s.step_number + 1);
    audit_trace.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "total_pay": total_pay.to_string(),
            "total_deduction": total_deduction.to_string()
        }),
        output: serde_json::json!({
            "net_pay": net_pay.to_string(),
            "negative": negative_net_pay.is_some()
        }),
        reasoning: if negative_net_pay.is_some() {
            format!(
                "{} − {} = {}; deductions exceed gross pay, acknowledgement required",
                total_pay, total_deduction, net_pay
            )
        } else {
            format!("{} − {} = {}", total_pay, total_deduction, net_pay)
        },
    });

    PayrollLineResult {
        run_id,
        employee_id: profile.employee_id.clone(),
        profile: profile.clone(),
        attendance: attendance.clone(),
        earnings: allowances.earnings,
        deductions: deductions.deductions,
        taxable_base: deductions.taxable_base,
        total_pay,
        total_deduction,
        net_pay,
        negative_net_pay,
        audit_trace,
    }
}
