//! Statutory deduction calculation.
//!
//! Computes the four social insurance contributions, income tax and local
//! income tax from the taxable base. Every deduction key is always present;
//! a component the employee is not enrolled in is zero.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::{calculate_income_tax, truncate_to_unit};
use crate::config::StatutoryRateTable;
use crate::models::{
    AuditStep, CompensationProfile, DeductionComponent, EarnedAmount, EarningComponent,
    InsuranceType, TaxType,
};

/// The statutory deductions for one employee and month.
#[derive(Debug, Clone)]
pub struct DeductionBreakdown {
    /// Sum of earnings not flagged non-taxable.
    pub taxable_base: Decimal,
    /// All six deduction components.
    pub deductions: BTreeMap<DeductionComponent, Decimal>,
    /// Sum of all deductions.
    pub total_deduction: Decimal,
    /// Audit steps, numbered from the `first_step` passed in.
    pub audit_steps: Vec<AuditStep>,
}

/// Sums the earnings that are subject to insurance and withholding.
pub fn taxable_base(earnings: &BTreeMap<EarningComponent, EarnedAmount>) -> Decimal {
    earnings
        .values()
        .filter(|e| e.taxable)
        .map(|e| e.amount)
        .sum()
}

/// Calculates every statutory deduction.
///
/// - Insurance: `truncate(taxable_base × employee_rate)` when enrolled.
/// - Income tax: bracket lookup, see [`calculate_income_tax`].
/// - Local tax: `truncate(income_tax × local_tax_rate)`.
///
/// Each amount is truncated on its own; totals are sums of truncated amounts.
pub fn calculate_deductions(
    profile: &CompensationProfile,
    earnings: &BTreeMap<EarningComponent, EarnedAmount>,
    table: &StatutoryRateTable,
    first_step: u32,
) -> DeductionBreakdown {
    let scale = table.policy.currency_scale;
    let base = taxable_base(earnings);
    let mut step = first_step;
    let mut deductions = BTreeMap::new();
    let mut audit_steps = Vec::new();

    for insurance in InsuranceType::ALL {
        let component = DeductionComponent::from(insurance);
        let enrolled = profile.is_enrolled_in(insurance);
        let employee_rate = table.insurance.rate(insurance).employee;
        let amount = if enrolled {
            truncate_to_unit(base * employee_rate, scale)
        } else {
            Decimal::ZERO
        };
        deductions.insert(component, amount);

        audit_steps.push(AuditStep {
            step_number: step,
            rule_id: "social_insurance".to_string(),
            rule_name: component.label().to_string(),
            input: serde_json::json!({
                "insurance": insurance,
                "enrolled": enrolled,
                "taxable_base": base.to_string(),
                "employee_rate": employee_rate.normalize().to_string()
            }),
            output: serde_json::json!({
                "amount": amount.to_string()
            }),
            reasoning: if enrolled {
                format!("{} × {} = {}", base, employee_rate.normalize(), amount)
            } else {
                "Not enrolled".to_string()
            },
        });
        step += 1;
    }

    let income_tax = if profile.withholds(TaxType::IncomeTax) {
        let result = calculate_income_tax(base, table, step);
        audit_steps.push(result.audit_step);
        result.amount
    } else {
        audit_steps.push(not_withheld(step, "income_tax", "Income Tax Withholding"));
        Decimal::ZERO
    };
    step += 1;
    deductions.insert(DeductionComponent::IncomeTax, income_tax);

    let local_tax = if profile.withholds(TaxType::LocalTax) {
        let amount = truncate_to_unit(income_tax * table.local_tax_rate, scale);
        audit_steps.push(AuditStep {
            step_number: step,
            rule_id: "local_tax".to_string(),
            rule_name: "Local Income Tax".to_string(),
            input: serde_json::json!({
                "income_tax": income_tax.to_string(),
                "local_tax_rate": table.local_tax_rate.normalize().to_string()
            }),
            output: serde_json::json!({
                "amount": amount.to_string()
            }),
            reasoning: format!(
                "{} × {} = {}",
                income_tax,
                table.local_tax_rate.normalize(),
                amount
            ),
        });
        amount
    } else {
        audit_steps.push(not_withheld(step, "local_tax", "Local Income Tax"));
        Decimal::ZERO
    };
    deductions.insert(DeductionComponent::LocalTax, local_tax);

    let total_deduction: Decimal = deductions.values().copied().sum();

    DeductionBreakdown {
        taxable_base: base,
        deductions,
        total_deduction,
        audit_steps,
    }
}

fn not_withheld(step_number: u32, rule_id: &str, rule_name: &str) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        input: serde_json::json!({ "enrolled": false }),
        output: serde_json::json!({ "amount": "0" }),
        reasoning: "Not withheld for this employee".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_rate_table;
    use crate::models::EmploymentType;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_profile(insurance: &[InsuranceType], taxes: &[TaxType]) -> CompensationProfile {
        CompensationProfile {
            employee_id: "emp_001".to_string(),
            name: "Kim Minji".to_string(),
            department: "Nursing".to_string(),
            position: "Care worker".to_string(),
            employment_type: EmploymentType::Monthly,
            base_wage: dec("2500000"),
            allowances: Default::default(),
            overtime_premium_rate: dec("0.5"),
            night_premium_rate: dec("0.5"),
            insurance_enrollment: insurance.iter().copied().collect(),
            tax_enrollment: taxes.iter().copied().collect(),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            termination_date: None,
        }
    }

    fn earnings(items: &[(EarningComponent, &str, bool)]) -> BTreeMap<EarningComponent, EarnedAmount> {
        items
            .iter()
            .map(|(component, amount, taxable)| {
                (
                    *component,
                    EarnedAmount {
                        amount: dec(amount),
                        taxable: *taxable,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_pension_worked_example() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(&[InsuranceType::Pension], &[]);
        let earnings = earnings(&[(EarningComponent::BasePay, "2500000", true)]);

        let result = calculate_deductions(&profile, &earnings, &table, 1);

        // 2,500,000 × 4.5% = 112,500
        assert_eq!(result.deductions[&DeductionComponent::Pension], dec("112500"));
        assert_eq!(result.total_deduction, dec("112500"));
    }

    #[test]
    fn test_all_six_keys_present_when_not_enrolled() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(&[], &[]);
        let earnings = earnings(&[(EarningComponent::BasePay, "2500000", true)]);

        let result = calculate_deductions(&profile, &earnings, &table, 1);

        assert_eq!(result.deductions.len(), 6);
        assert!(result.deductions.values().all(|amount| amount.is_zero()));
        assert_eq!(result.total_deduction, Decimal::ZERO);
    }

    #[test]
    fn test_non_taxable_earnings_excluded_from_base() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(&[InsuranceType::Pension], &[]);
        let earnings = earnings(&[
            (EarningComponent::BasePay, "2500000", true),
            (EarningComponent::MealAllowance, "200000", false),
        ]);

        let result = calculate_deductions(&profile, &earnings, &table, 1);

        assert_eq!(result.taxable_base, dec("2500000"));
        assert_eq!(result.deductions[&DeductionComponent::Pension], dec("112500"));
    }

    #[test]
    fn test_full_enrollment() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(
            &InsuranceType::ALL,
            &[TaxType::IncomeTax, TaxType::LocalTax],
        );
        let earnings = earnings(&[(EarningComponent::BasePay, "2500000", true)]);

        let result = calculate_deductions(&profile, &earnings, &table, 1);

        // 2,500,000 × 3.545% = 88,625
        assert_eq!(result.deductions[&DeductionComponent::Health], dec("88625"));
        // 2,500,000 × 0.459% = 11,475
        assert_eq!(result.deductions[&DeductionComponent::LongTermCare], dec("11475"));
        // 2,500,000 × 0.9% = 22,500
        assert_eq!(result.deductions[&DeductionComponent::Employment], dec("22500"));
        assert_eq!(result.deductions[&DeductionComponent::IncomeTax], dec("28800"));
        assert_eq!(result.deductions[&DeductionComponent::LocalTax], dec("2880"));
        assert_eq!(
            result.total_deduction,
            dec("112500") + dec("88625") + dec("11475") + dec("22500") + dec("28800") + dec("2880")
        );
        assert_eq!(result.audit_steps.len(), 6);
    }

    #[test]
    fn test_each_insurance_truncated_independently() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(&[InsuranceType::Health, InsuranceType::LongTermCare], &[]);
        let earnings = earnings(&[(EarningComponent::BasePay, "1234567", true)]);

        let result = calculate_deductions(&profile, &earnings, &table, 1);

        // 1,234,567 × 0.03545 = 43,765.40… → 43,765
        assert_eq!(result.deductions[&DeductionComponent::Health], dec("43765"));
        // 1,234,567 × 0.00459 = 5,666.66… → 5,666
        assert_eq!(result.deductions[&DeductionComponent::LongTermCare], dec("5666"));
        assert_eq!(result.total_deduction, dec("49431"));
    }

    #[test]
    fn test_local_tax_withheld_without_income_tax_is_zero() {
        let table = sample_rate_table("2026-01");
        let profile = create_test_profile(&[], &[TaxType::LocalTax]);
        let earnings = earnings(&[(EarningComponent::BasePay, "2500000", true)]);

        let result = calculate_deductions(&profile, &earnings, &table, 1);

        assert_eq!(result.deductions[&DeductionComponent::IncomeTax], Decimal::ZERO);
        assert_eq!(result.deductions[&DeductionComponent::LocalTax], Decimal::ZERO);
    }
}
