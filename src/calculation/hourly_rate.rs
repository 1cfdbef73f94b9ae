//! Base hourly rate derivation.
//!
//! Every hour-based component (overtime, night, weekly rest, hourly base pay)
//! is priced from a single base hourly rate derived here.

use rust_decimal::Decimal;

use crate::config::WagePolicy;
use crate::models::{AuditStep, CompensationProfile, EmploymentType};

/// The result of deriving a base hourly rate, including the rate and audit step.
#[derive(Debug, Clone)]
pub struct HourlyRateResult {
    /// The base hourly rate, kept at full precision.
    pub rate: Decimal,
    /// The audit step recording this derivation.
    pub audit_step: AuditStep,
}

/// Determines an employee's base hourly rate.
///
/// - `Hourly` employees: `base_wage` is the rate.
/// - `Monthly` employees: `base_wage / standard_monthly_hours`.
///
/// The rate is not truncated; truncation applies to the amounts priced from it.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::derive_hourly_rate;
/// use payroll_engine::config::WagePolicy;
/// use payroll_engine::models::{CompensationProfile, EmploymentType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let policy = WagePolicy {
///     standard_monthly_work_days: Decimal::from(22),
///     standard_monthly_hours: Decimal::from(200),
///     standard_weekly_rest_hours: Decimal::from(35),
///     currency_scale: 0,
/// };
/// let profile = CompensationProfile {
///     employee_id: "emp_001".to_string(),
///     name: "Kim Minji".to_string(),
///     department: String::new(),
///     position: String::new(),
///     employment_type: EmploymentType::Monthly,
///     base_wage: Decimal::from(2_400_000),
///     allowances: Default::default(),
///     overtime_premium_rate: Decimal::ZERO,
///     night_premium_rate: Decimal::ZERO,
///     insurance_enrollment: Default::default(),
///     tax_enrollment: Default::default(),
///     hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
///     termination_date: None,
/// };
///
/// let result = derive_hourly_rate(&profile, &policy, 1);
/// assert_eq!(result.rate, Decimal::from(12_000));
/// ```
pub fn derive_hourly_rate(
    profile: &CompensationProfile,
    policy: &WagePolicy,
    step_number: u32,
) -> HourlyRateResult {
    let (rate, source, reasoning) = match profile.employment_type {
        EmploymentType::Hourly => (
            profile.base_wage,
            "hourly_wage",
            format!("Hourly employee: base hourly rate is the wage {}", profile.base_wage),
        ),
        EmploymentType::Monthly => {
            let rate = profile.base_wage / policy.standard_monthly_hours;
            (
                rate,
                "monthly_salary",
                format!(
                    "Monthly salary {} ÷ {} standard monthly hours = {}",
                    profile.base_wage,
                    policy.standard_monthly_hours.normalize(),
                    rate.normalize()
                ),
            )
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "hourly_rate".to_string(),
        rule_name: "Base Hourly Rate".to_string(),
        input: serde_json::json!({
            "employee_id": profile.employee_id,
            "employment_type": profile.employment_type,
            "base_wage": profile.base_wage.to_string(),
            "standard_monthly_hours": policy.standard_monthly_hours.to_string()
        }),
        output: serde_json::json!({
            "rate": rate.normalize().to_string(),
            "source": source
        }),
        reasoning,
    };

    HourlyRateResult { rate, audit_step }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_rate_table;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_profile(employment_type: EmploymentType, base_wage: &str) -> CompensationProfile {
        CompensationProfile {
            employee_id: "emp_001".to_string(),
            name: "Kim Minji".to_string(),
            department: "Nursing".to_string(),
            position: "Care worker".to_string(),
            employment_type,
            base_wage: dec(base_wage),
            allowances: Default::default(),
            overtime_premium_rate: dec("0.5"),
            night_premium_rate: dec("0.5"),
            insurance_enrollment: Default::default(),
            tax_enrollment: Default::default(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            termination_date: None,
        }
    }

    #[test]
    fn test_hourly_employee_uses_wage_as_rate() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(EmploymentType::Hourly, "12000");

        let result = derive_hourly_rate(&profile, &table.policy, 1);

        assert_eq!(result.rate, dec("12000"));
        assert_eq!(result.audit_step.rule_id, "hourly_rate");
        assert_eq!(result.audit_step.output["source"], "hourly_wage");
    }

    #[test]
    fn test_monthly_employee_divides_by_standard_hours() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(EmploymentType::Monthly, "2090000");

        let result = derive_hourly_rate(&profile, &table.policy, 1);

        // 2,090,000 / 209 = 10,000
        assert_eq!(result.rate, dec("10000"));
        assert_eq!(result.audit_step.output["source"], "monthly_salary");
    }

    #[test]
    fn test_monthly_rate_keeps_full_precision() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(EmploymentType::Monthly, "2500000");

        let result = derive_hourly_rate(&profile, &table.policy, 1);

        assert!(result.rate > dec("11961.72"));
        assert!(result.rate < dec("11961.73"));
        assert!(result.rate.scale() > 2);
    }

    #[test]
    fn test_audit_step_has_correct_step_number() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(EmploymentType::Hourly, "12000");

        let result = derive_hourly_rate(&profile, &table.policy, 5);

        assert_eq!(result.audit_step.step_number, 5);
    }
}
