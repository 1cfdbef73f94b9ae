//! Fixed monthly allowances.

use crate::models::{AuditStep, CompensationProfile, EarnedAmount, EarningComponent};

/// The fixed allowances copied from a profile.
#[derive(Debug, Clone)]
pub struct FixedAllowancesResult {
    /// Each allowance with its taxable flag, in payslip order.
    pub allowances: Vec<(EarningComponent, EarnedAmount)>,
    /// The audit step recording the copy.
    pub audit_step: AuditStep,
}

/// Copies the profile's fixed allowances verbatim.
///
/// Amounts are not truncated and are always part of total pay; the taxable
/// flag decides only whether they enter the taxable base.
pub fn collect_fixed_allowances(
    profile: &CompensationProfile,
    step_number: u32,
) -> FixedAllowancesResult {
    let source = &profile.allowances;
    let allowances: Vec<(EarningComponent, EarnedAmount)> = [
        (EarningComponent::MealAllowance, &source.meal),
        (EarningComponent::TransportAllowance, &source.transport),
        (EarningComponent::PositionAllowance, &source.position),
        (EarningComponent::RiskAllowance, &source.risk),
        (EarningComponent::LongevityAllowance, &source.longevity),
    ]
    .into_iter()
    .map(|(component, allowance)| {
        (
            component,
            EarnedAmount {
                amount: allowance.amount,
                taxable: allowance.taxable,
            },
        )
    })
    .collect();

    let non_taxable: Vec<&'static str> = allowances
        .iter()
        .filter(|(_, earned)| !earned.taxable && !earned.amount.is_zero())
        .map(|(component, _)| component.label())
        .collect();

    let output: serde_json::Map<String, serde_json::Value> = allowances
        .iter()
        .map(|(component, earned)| {
            (
                component.label().to_string(),
                serde_json::json!({
                    "amount": earned.amount.to_string(),
                    "taxable": earned.taxable
                }),
            )
        })
        .collect();

    let reasoning = if non_taxable.is_empty() {
        "Fixed allowances copied from profile; all taxable".to_string()
    } else {
        format!(
            "Fixed allowances copied from profile; excluded from taxable base: {}",
            non_taxable.join(", ")
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "fixed_allowances".to_string(),
        rule_name: "Fixed Allowances".to_string(),
        input: serde_json::json!({
            "employee_id": profile.employee_id
        }),
        output: serde_json::Value::Object(output),
        reasoning,
    };

    FixedAllowancesResult {
        allowances,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentType, FixedAllowance, FixedAllowances};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_profile(allowances: FixedAllowances) -> CompensationProfile {
        CompensationProfile {
            employee_id: "emp_001".to_string(),
            name: "Kim Minji".to_string(),
            department: "Nursing".to_string(),
            position: "Care worker".to_string(),
            employment_type: EmploymentType::Monthly,
            base_wage: dec("2500000"),
            allowances,
            overtime_premium_rate: dec("0.5"),
            night_premium_rate: dec("0.5"),
            insurance_enrollment: Default::default(),
            tax_enrollment: Default::default(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            termination_date: None,
        }
    }

    #[test]
    fn test_allowances_copied_in_payslip_order() {
        let profile = create_test_profile(FixedAllowances {
            meal: FixedAllowance::non_taxable(dec("200000")),
            transport: FixedAllowance::taxable(dec("100000")),
            ..Default::default()
        });

        let result = collect_fixed_allowances(&profile, 1);

        let components: Vec<_> = result.allowances.iter().map(|(c, _)| *c).collect();
        assert_eq!(components, EarningComponent::ALL[4..].to_vec());
        assert_eq!(result.allowances[0].1.amount, dec("200000"));
        assert!(!result.allowances[0].1.taxable);
        assert!(result.allowances[1].1.taxable);
    }

    #[test]
    fn test_fractional_amounts_are_not_truncated() {
        let profile = create_test_profile(FixedAllowances {
            risk: FixedAllowance::taxable(dec("33333.50")),
            ..Default::default()
        });

        let result = collect_fixed_allowances(&profile, 1);

        assert_eq!(result.allowances[3].1.amount, dec("33333.50"));
    }

    #[test]
    fn test_reasoning_names_non_taxable_allowances() {
        let profile = create_test_profile(FixedAllowances {
            meal: FixedAllowance::non_taxable(dec("200000")),
            ..Default::default()
        });

        let result = collect_fixed_allowances(&profile, 1);

        assert!(result.audit_step.reasoning.contains("Meal allowance"));
        assert_eq!(result.audit_step.rule_id, "fixed_allowances");
    }
}
