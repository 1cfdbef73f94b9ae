//! Monthly payroll extraction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{DeductionComponent, EarningComponent, EmploymentType, LineOutcome, PayMonth};
use crate::run::PayrollRun;

/// Whether a line was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Amounts are present.
    Calculated,
    /// Amounts are empty; `error_code` and `reason` explain why.
    Failed,
}

/// One flat row per employee.
///
/// Column order is field order. Identity columns are always filled; amount
/// columns are empty for failed lines.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRow {
    pub target_month: PayMonth,
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
    pub employment_type: EmploymentType,
    pub status: LineStatus,
    pub base_pay: Option<Decimal>,
    pub overtime_pay: Option<Decimal>,
    pub night_pay: Option<Decimal>,
    pub weekly_rest_allowance: Option<Decimal>,
    pub meal_allowance: Option<Decimal>,
    pub transport_allowance: Option<Decimal>,
    pub position_allowance: Option<Decimal>,
    pub risk_allowance: Option<Decimal>,
    pub longevity_allowance: Option<Decimal>,
    pub total_pay: Option<Decimal>,
    pub taxable_base: Option<Decimal>,
    pub pension: Option<Decimal>,
    pub health: Option<Decimal>,
    pub long_term_care: Option<Decimal>,
    pub employment: Option<Decimal>,
    pub income_tax: Option<Decimal>,
    pub local_tax: Option<Decimal>,
    pub total_deduction: Option<Decimal>,
    pub net_pay: Option<Decimal>,
    /// Who acknowledged a negative net pay, if anyone.
    pub acknowledged_by: Option<String>,
    pub error_code: Option<String>,
    pub reason: Option<String>,
}

/// Flattens a calculated or locked run into extraction rows, ordered by
/// employee id.
pub fn extract_rows(run: &PayrollRun) -> EngineResult<Vec<ExtractRow>> {
    let lines = run
        .lines()
        .ok_or_else(|| run.invalid_transition("extract"))?;
    let target_month = run.header().target_month;

    Ok(lines
        .values()
        .map(|outcome| match outcome {
            LineOutcome::Calculated(line) => {
                let earning = |c| Some(line.earning(c));
                let deduction = |c| Some(line.deduction(c));
                ExtractRow {
                    target_month,
                    employee_id: line.employee_id.clone(),
                    name: line.profile.name.clone(),
                    department: line.profile.department.clone(),
                    position: line.profile.position.clone(),
                    employment_type: line.profile.employment_type,
                    status: LineStatus::Calculated,
                    base_pay: earning(EarningComponent::BasePay),
                    overtime_pay: earning(EarningComponent::OvertimePay),
                    night_pay: earning(EarningComponent::NightPay),
                    weekly_rest_allowance: earning(EarningComponent::WeeklyRestAllowance),
                    meal_allowance: earning(EarningComponent::MealAllowance),
                    transport_allowance: earning(EarningComponent::TransportAllowance),
                    position_allowance: earning(EarningComponent::PositionAllowance),
                    risk_allowance: earning(EarningComponent::RiskAllowance),
                    longevity_allowance: earning(EarningComponent::LongevityAllowance),
                    total_pay: Some(line.total_pay),
                    taxable_base: Some(line.taxable_base),
                    pension: deduction(DeductionComponent::Pension),
                    health: deduction(DeductionComponent::Health),
                    long_term_care: deduction(DeductionComponent::LongTermCare),
                    employment: deduction(DeductionComponent::Employment),
                    income_tax: deduction(DeductionComponent::IncomeTax),
                    local_tax: deduction(DeductionComponent::LocalTax),
                    total_deduction: Some(line.total_deduction),
                    net_pay: Some(line.net_pay),
                    acknowledged_by: line
                        .negative_net_pay
                        .as_ref()
                        .and_then(|w| w.acknowledgement.as_ref())
                        .map(|a| a.acknowledged_by.clone()),
                    error_code: None,
                    reason: None,
                }
            }
            LineOutcome::Failed(failed) => ExtractRow {
                target_month,
                employee_id: failed.employee_id.clone(),
                name: failed.name.clone(),
                department: failed.department.clone(),
                position: failed.position.clone(),
                employment_type: failed.employment_type,
                status: LineStatus::Failed,
                base_pay: None,
                overtime_pay: None,
                night_pay: None,
                weekly_rest_allowance: None,
                meal_allowance: None,
                transport_allowance: None,
                position_allowance: None,
                risk_allowance: None,
                longevity_allowance: None,
                total_pay: None,
                taxable_base: None,
                pension: None,
                health: None,
                long_term_care: None,
                employment: None,
                income_tax: None,
                local_tax: None,
                total_deduction: None,
                net_pay: None,
                acknowledged_by: None,
                error_code: Some(failed.error_code.clone()),
                reason: Some(failed.reason.clone()),
            },
        })
        .collect())
}

/// Renders rows as CSV with a header line.
pub fn render_csv(rows: &[ExtractRow]) -> EngineResult<String> {
    let render_error = |message: String| EngineError::CalculationError {
        message: format!("failed to render extract: {}", message),
    };

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| render_error(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| render_error(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| render_error(e.to_string()))
}
