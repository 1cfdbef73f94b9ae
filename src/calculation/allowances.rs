//! Allowance calculation.
//!
//! Combines the individual earning calculators into the full set of earned
//! components for one employee and month.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::rounding::checked_sum;
use super::{
    calculate_base_pay, calculate_night_pay, calculate_overtime_pay,
    calculate_weekly_rest_allowance, collect_fixed_allowances, derive_hourly_rate,
};
use crate::config::WagePolicy;
use crate::error::EngineResult;
use crate::models::{
    AttendanceFacts, AuditStep, CompensationProfile, EarnedAmount, EarningComponent, PayMonth,
};

/// Everything an employee earned in a month.
#[derive(Debug, Clone)]
pub struct AllowanceBreakdown {
    /// The base hourly rate the hour-based components were priced from.
    pub hourly_rate: Decimal,
    /// Every earned component, in payslip order.
    pub earnings: BTreeMap<EarningComponent, EarnedAmount>,
    /// Sum of all earned components.
    pub total_pay: Decimal,
    /// Audit steps, numbered from the `first_step` passed in.
    pub audit_steps: Vec<AuditStep>,
}

/// Computes every earned component for one employee and month.
///
/// Attendance and profile are validated first. Negative hours or premium
/// rates are errors, never clamped to zero.
///
/// # Errors
///
/// Returns [`EngineError::InvalidAttendance`](crate::error::EngineError::InvalidAttendance)
/// or [`EngineError::InvalidProfile`](crate::error::EngineError::InvalidProfile).
pub fn calculate_allowances(
    profile: &CompensationProfile,
    attendance: &AttendanceFacts,
    policy: &WagePolicy,
    month: PayMonth,
    first_step: u32,
) -> EngineResult<AllowanceBreakdown> {
    attendance.validate()?;
    profile.validate()?;

    let mut step = first_step;
    let mut next_step = || {
        let current = step;
        step += 1;
        current
    };

    let hourly = derive_hourly_rate(profile, policy, next_step());
    let rate = hourly.rate;
    let scale = policy.currency_scale;

    let base = calculate_base_pay(profile, attendance, rate, policy, month, next_step())?;
    let overtime = calculate_overtime_pay(profile, attendance, rate, scale, next_step())?;
    let night = calculate_night_pay(profile, attendance, rate, scale, next_step())?;
    let rest = calculate_weekly_rest_allowance(attendance, rate, policy, next_step())?;
    let fixed = collect_fixed_allowances(profile, next_step());

    let mut earnings = BTreeMap::new();
    for (component, amount) in [
        (EarningComponent::BasePay, base.amount),
        (EarningComponent::OvertimePay, overtime.amount),
        (EarningComponent::NightPay, night.amount),
        (EarningComponent::WeeklyRestAllowance, rest.amount),
    ] {
        earnings.insert(
            component,
            EarnedAmount {
                amount,
                taxable: true,
            },
        );
    }
    earnings.extend(fixed.allowances);

    let total_pay = checked_sum("total pay", earnings.values().map(|e| e.amount))?;

    debug!(
        employee_id = %profile.employee_id,
        month = %month,
        total_pay = %total_pay,
        "Calculated earnings"
    );

    Ok(AllowanceBreakdown {
        hourly_rate: rate,
        earnings,
        total_pay,
        audit_steps: vec![
            hourly.audit_step,
            base.audit_step,
            overtime.audit_step,
            night.audit_step,
            rest.audit_step,
            fixed.audit_step,
        ],
    })
}
