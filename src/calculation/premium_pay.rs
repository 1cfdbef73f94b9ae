//! Overtime and night premium pay.
//!
//! Hours that are both overtime and night carry both premiums additively:
//! `rate × (1 + overtime_premium_rate + night_premium_rate)`. The base
//! portion of such an hour is paid once, through overtime pay.

use rust_decimal::Decimal;

use super::rounding::{checked_product, checked_sum};
use super::truncate_to_unit;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceFacts, AuditStep, CompensationProfile};

/// The result of a premium pay calculation.
#[derive(Debug, Clone)]
pub struct PremiumPayResult {
    /// The truncated premium pay amount.
    pub amount: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates overtime pay: `rate × overtime_hours × (1 + overtime_premium_rate)`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_overtime_pay;
/// use payroll_engine::models::{AttendanceFacts, CompensationProfile, EmploymentType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let profile = CompensationProfile {
///     employee_id: "emp_001".to_string(),
///     name: "Kim Minji".to_string(),
///     department: String::new(),
///     position: String::new(),
///     employment_type: EmploymentType::Hourly,
///     base_wage: Decimal::from(12_000),
///     allowances: Default::default(),
///     overtime_premium_rate: Decimal::new(5, 1),
///     night_premium_rate: Decimal::new(5, 1),
///     insurance_enrollment: Default::default(),
///     tax_enrollment: Default::default(),
///     hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///     termination_date: None,
/// };
/// let attendance = AttendanceFacts {
///     employee_id: "emp_001".to_string(),
///     month: "2026-01".parse().unwrap(),
///     work_days: 20,
///     regular_hours: Decimal::from(160),
///     overtime_hours: Decimal::from(10),
///     night_hours: Decimal::ZERO,
///     holiday_hours: Decimal::ZERO,
///     night_overtime_hours: Decimal::ZERO,
///     qualifies_for_weekly_rest_allowance: true,
/// };
///
/// let result = calculate_overtime_pay(&profile, &attendance, Decimal::from(12_000), 0, 3)?;
/// assert_eq!(result.amount, Decimal::from(180_000));
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the amount is out of range.
pub fn calculate_overtime_pay(
    profile: &CompensationProfile,
    attendance: &AttendanceFacts,
    hourly_rate: Decimal,
    currency_scale: u32,
    step_number: u32,
) -> EngineResult<PremiumPayResult> {
    let multiplier = checked_sum(
        "overtime multiplier",
        [Decimal::ONE, profile.overtime_premium_rate],
    )?;
    let amount = truncate_to_unit(
        checked_product(
            "overtime pay",
            &[hourly_rate, attendance.overtime_hours, multiplier],
        )?,
        currency_scale,
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime_pay".to_string(),
        rule_name: "Overtime Pay".to_string(),
        input: serde_json::json!({
            "hourly_rate": hourly_rate.normalize().to_string(),
            "overtime_hours": attendance.overtime_hours.normalize().to_string(),
            "overtime_premium_rate": profile.overtime_premium_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "multiplier": multiplier.normalize().to_string(),
            "amount": amount.to_string()
        }),
        reasoning: format!(
            "{} h × {} × {} = {}",
            attendance.overtime_hours.normalize(),
            hourly_rate.normalize(),
            multiplier.normalize(),
            amount
        ),
    };

    Ok(PremiumPayResult { amount, audit_step })
}

/// Calculates night pay.
///
/// Night hours outside overtime earn `rate × (1 + night_premium_rate)`.
/// Night hours that are also overtime earn only the night premium here,
/// `rate × night_premium_rate`, since their base is already in overtime pay.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if the amount is out of range.
pub fn calculate_night_pay(
    profile: &CompensationProfile,
    attendance: &AttendanceFacts,
    hourly_rate: Decimal,
    currency_scale: u32,
    step_number: u32,
) -> EngineResult<PremiumPayResult> {
    let plain_night_hours = attendance
        .night_hours
        .checked_sub(attendance.night_overtime_hours)
        .ok_or_else(|| EngineError::CalculationError {
            message: "night hours are out of range".to_string(),
        })?;
    let multiplier = checked_sum("night multiplier", [Decimal::ONE, profile.night_premium_rate])?;
    let plain = checked_product("night pay", &[hourly_rate, plain_night_hours, multiplier])?;
    let overlap = checked_product(
        "night pay",
        &[hourly_rate, attendance.night_overtime_hours, profile.night_premium_rate],
    )?;
    let amount = truncate_to_unit(checked_sum("night pay", [plain, overlap])?, currency_scale);

    let audit_step = AuditStep {
        step_number,
        rule_id: "night_pay".to_string(),
        rule_name: "Night Pay".to_string(),
        input: serde_json::json!({
            "hourly_rate": hourly_rate.normalize().to_string(),
            "night_hours": attendance.night_hours.normalize().to_string(),
            "night_overtime_hours": attendance.night_overtime_hours.normalize().to_string(),
            "night_premium_rate": profile.night_premium_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "plain_night_hours": plain_night_hours.normalize().to_string(),
            "amount": amount.to_string()
        }),
        reasoning: if attendance.night_overtime_hours.is_zero() {
            format!(
                "{} night h × {} × (1 + {}) = {}",
                attendance.night_hours.normalize(),
                hourly_rate.normalize(),
                profile.night_premium_rate.normalize(),
                amount
            )
        } else {
            format!(
                "{} night h × {} × (1 + {}) + {} night overtime h × {} × {} = {}",
                plain_night_hours.normalize(),
                hourly_rate.normalize(),
                profile.night_premium_rate.normalize(),
                attendance.night_overtime_hours.normalize(),
                hourly_rate.normalize(),
                profile.night_premium_rate.normalize(),
                amount
            )
        },
    };

    Ok(PremiumPayResult { amount, audit_step })
}
