//! Weekly rest allowance.
//!
//! Paid rest for employees who met the weekly attendance threshold. Whether
//! the threshold was met is decided upstream and arrives as a flag on the
//! attendance facts.

use rust_decimal::Decimal;

use super::rounding::checked_product;
use super::truncate_to_unit;
use crate::config::WagePolicy;
use crate::error::EngineResult;
use crate::models::{AttendanceFacts, AuditStep};

/// The result of the weekly rest allowance calculation.
#[derive(Debug, Clone)]
pub struct WeeklyRestResult {
    /// The truncated allowance, exactly zero when the employee does not qualify.
    pub amount: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the weekly rest allowance: `rate × standard_weekly_rest_hours`
/// when the employee qualifies, zero otherwise. No proration applies.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`](crate::error::EngineError::CalculationError)
/// if the allowance is out of range.
pub fn calculate_weekly_rest_allowance(
    attendance: &AttendanceFacts,
    hourly_rate: Decimal,
    policy: &WagePolicy,
    step_number: u32,
) -> EngineResult<WeeklyRestResult> {
    let qualifies = attendance.qualifies_for_weekly_rest_allowance;
    let rest_hours = policy.standard_weekly_rest_hours;

    let (amount, reasoning) = if qualifies {
        let amount = truncate_to_unit(
            checked_product("weekly rest allowance", &[hourly_rate, rest_hours])?,
            policy.currency_scale,
        );
        (
            amount,
            format!(
                "Qualifies: {} rest h × {} = {}",
                rest_hours.normalize(),
                hourly_rate.normalize(),
                amount
            ),
        )
    } else {
        (
            Decimal::ZERO,
            "Does not meet the weekly attendance threshold".to_string(),
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "weekly_rest_allowance".to_string(),
        rule_name: "Weekly Rest Allowance".to_string(),
        input: serde_json::json!({
            "qualifies": qualifies,
            "hourly_rate": hourly_rate.normalize().to_string(),
            "standard_weekly_rest_hours": rest_hours.normalize().to_string()
        }),
        output: serde_json::json!({
            "amount": amount.to_string()
        }),
        reasoning,
    };

    Ok(WeeklyRestResult { amount, audit_step })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_rate_table;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_attendance(qualifies: bool) -> AttendanceFacts {
        AttendanceFacts {
            employee_id: "emp_001".to_string(),
            month: "2026-01".parse().unwrap(),
            work_days: 20,
            regular_hours: dec("160"),
            overtime_hours: Decimal::ZERO,
            night_hours: Decimal::ZERO,
            holiday_hours: Decimal::ZERO,
            night_overtime_hours: Decimal::ZERO,
            qualifies_for_weekly_rest_allowance: qualifies,
        }
    }

    #[test]
    fn test_qualifying_employee_is_paid_rest_hours() {
        let table = sample_rate_table("2026-01");
        let attendance = create_test_attendance(true);

        let result = calculate_weekly_rest_allowance(&attendance, dec("12000"), &table.policy, 1).unwrap();

        // 12,000 × 35 = 420,000
        assert_eq!(result.amount, dec("420000"));
        assert_eq!(result.audit_step.input["qualifies"], true);
    }

    #[test]
    fn test_non_qualifying_employee_gets_exactly_zero() {
        let table = sample_rate_table("2026-01");
        let attendance = create_test_attendance(false);

        let result = calculate_weekly_rest_allowance(&attendance, dec("12000"), &table.policy, 1).unwrap();

        assert_eq!(result.amount, Decimal::ZERO);
        assert!(result.audit_step.reasoning.contains("threshold"));
    }

    #[test]
    fn test_allowance_is_truncated() {
        let table = sample_rate_table("2026-01");
        let attendance = create_test_attendance(true);

        let result =
            calculate_weekly_rest_allowance(&attendance, dec("11961.7224"), &table.policy, 1).unwrap();

        // 11,961.7224 × 35 = 418,660.284 → 418,660
        assert_eq!(result.amount, dec("418660"));
    }
}
