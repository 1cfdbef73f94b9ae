//! Base pay calculation.
//!
//! Hourly employees are paid for their regular and holiday hours at the base
//! hourly rate. Monthly employees receive their salary, prorated by work days
//! when they join or leave part-way through the month.

use rust_decimal::Decimal;

use super::rounding::{checked_product, checked_sum};
use super::truncate_to_unit;
use crate::config::WagePolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceFacts, AuditStep, CompensationProfile, EmploymentType, PayMonth};

/// The result of calculating base pay.
#[derive(Debug, Clone)]
pub struct BasePayResult {
    /// The truncated base pay amount.
    pub amount: Decimal,
    /// Whether a monthly salary was prorated.
    pub prorated: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates base pay for one employee and month.
///
/// - `Hourly`: `hourly_rate × (regular_hours + holiday_hours)`.
/// - `Monthly`, full month: `base_wage`.
/// - `Monthly`, hired or terminated mid-month:
///   `base_wage × min(work_days, standard_monthly_work_days) / standard_monthly_work_days`.
///
/// # Arguments
///
/// * `profile` - The employee's compensation profile
/// * `attendance` - The employee's attendance facts for the month
/// * `hourly_rate` - The base hourly rate from [`derive_hourly_rate`](super::derive_hourly_rate)
/// * `policy` - Wage policy from the effective rate table
/// * `month` - The month being paid
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the wage or hours are too
/// large to price.
pub fn calculate_base_pay(
    profile: &CompensationProfile,
    attendance: &AttendanceFacts,
    hourly_rate: Decimal,
    policy: &WagePolicy,
    month: PayMonth,
    step_number: u32,
) -> EngineResult<BasePayResult> {
    match profile.employment_type {
        EmploymentType::Hourly => {
            let hours = checked_sum(
                "base pay hours",
                [attendance.regular_hours, attendance.holiday_hours],
            )?;
            let amount = truncate_to_unit(
                checked_product("base pay", &[hourly_rate, hours])?,
                policy.currency_scale,
            );

            let audit_step = AuditStep {
                step_number,
                rule_id: "base_pay_hourly".to_string(),
                rule_name: "Base Pay (Hourly)".to_string(),
                input: serde_json::json!({
                    "hourly_rate": hourly_rate.normalize().to_string(),
                    "regular_hours": attendance.regular_hours.normalize().to_string(),
                    "holiday_hours": attendance.holiday_hours.normalize().to_string()
                }),
                output: serde_json::json!({
                    "hours": hours.normalize().to_string(),
                    "amount": amount.to_string()
                }),
                reasoning: format!(
                    "{} h × {} = {}",
                    hours.normalize(),
                    hourly_rate.normalize(),
                    amount
                ),
            };

            Ok(BasePayResult {
                amount,
                prorated: false,
                audit_step,
            })
        }
        EmploymentType::Monthly if profile.is_partial_month(month) => {
            let standard_days = policy.standard_monthly_work_days;
            let paid_days = Decimal::from(attendance.work_days).min(standard_days);
            let earned = checked_product("base pay", &[profile.base_wage, paid_days])?
                .checked_div(standard_days)
                .ok_or_else(|| EngineError::CalculationError {
                    message: "base pay is out of range".to_string(),
                })?;
            let amount = truncate_to_unit(earned, policy.currency_scale);

            let audit_step = AuditStep {
                step_number,
                rule_id: "base_pay_monthly".to_string(),
                rule_name: "Base Pay (Monthly)".to_string(),
                input: serde_json::json!({
                    "base_wage": profile.base_wage.to_string(),
                    "work_days": attendance.work_days,
                    "standard_monthly_work_days": standard_days.normalize().to_string(),
                    "hire_date": profile.hire_date.to_string(),
                    "termination_date": profile.termination_date.map(|d| d.to_string())
                }),
                output: serde_json::json!({
                    "prorated": true,
                    "paid_days": paid_days.normalize().to_string(),
                    "amount": amount.to_string()
                }),
                reasoning: format!(
                    "Hired or terminated mid-month: {} × {} / {} days = {}",
                    profile.base_wage,
                    paid_days.normalize(),
                    standard_days.normalize(),
                    amount
                ),
            };

            Ok(BasePayResult {
                amount,
                prorated: true,
                audit_step,
            })
        }
        EmploymentType::Monthly => {
            let amount = profile.base_wage;

            let audit_step = AuditStep {
                step_number,
                rule_id: "base_pay_monthly".to_string(),
                rule_name: "Base Pay (Monthly)".to_string(),
                input: serde_json::json!({
                    "base_wage": profile.base_wage.to_string(),
                    "work_days": attendance.work_days
                }),
                output: serde_json::json!({
                    "prorated": false,
                    "amount": amount.to_string()
                }),
                reasoning: format!("Employed for the whole month: full salary {}", amount),
            };

            Ok(BasePayResult {
                amount,
                prorated: false,
                audit_step,
            })
        }
    }
}
