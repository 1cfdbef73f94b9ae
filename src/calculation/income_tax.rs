//! Income tax withholding from the bracket table.

use rust_decimal::Decimal;

use super::truncate_to_unit;
use crate::config::{StatutoryRateTable, TaxBracket};
use crate::models::AuditStep;

/// The result of an income tax lookup.
#[derive(Debug, Clone)]
pub struct IncomeTaxResult {
    /// The truncated withholding amount.
    pub amount: Decimal,
    /// Index of the bracket that applied.
    pub bracket_index: usize,
    /// The audit step recording the lookup.
    pub audit_step: AuditStep,
}

/// Finds the bracket covering `taxable_base` and its lower bound.
///
/// Upper bounds are inclusive: a base equal to a boundary falls in the lower
/// bracket. Returns `None` only for an empty table.
pub fn find_bracket(brackets: &[TaxBracket], taxable_base: Decimal) -> Option<(usize, Decimal)> {
    let mut lower_bound = Decimal::ZERO;
    for (index, bracket) in brackets.iter().enumerate() {
        match bracket.upper_bound {
            Some(upper) if taxable_base > upper => lower_bound = upper,
            _ => return Some((index, lower_bound)),
        }
    }
    None
}

/// Calculates income tax withholding:
/// `truncate(base_amount + (taxable_base − lower_bound) × marginal_rate)`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_income_tax;
/// use payroll_engine::config::{
///     InsuranceRate, InsuranceRates, StatutoryRateTable, TaxBracket, WagePolicy,
/// };
/// use rust_decimal::Decimal;
///
/// let rate = InsuranceRate { employee: Decimal::ZERO, employer: Decimal::ZERO };
/// let table = StatutoryRateTable {
///     effective_month: "2026-01".parse().unwrap(),
///     insurance: InsuranceRates {
///         pension: rate,
///         health: rate,
///         long_term_care: rate,
///         employment: rate,
///     },
///     income_tax_brackets: vec![
///         TaxBracket {
///             upper_bound: Some(Decimal::from(1_000_000)),
///             base_amount: Decimal::ZERO,
///             marginal_rate: Decimal::ZERO,
///         },
///         TaxBracket {
///             upper_bound: None,
///             base_amount: Decimal::ZERO,
///             marginal_rate: Decimal::new(1, 1),
///         },
///     ],
///     local_tax_rate: Decimal::new(1, 1),
///     policy: WagePolicy {
///         standard_monthly_work_days: Decimal::from(22),
///         standard_monthly_hours: Decimal::from(209),
///         standard_weekly_rest_hours: Decimal::from(35),
///         currency_scale: 0,
///     },
/// };
///
/// let result = calculate_income_tax(Decimal::from(1_500_000), &table, 1);
/// assert_eq!(result.amount, Decimal::from(50_000));
/// assert_eq!(result.bracket_index, 1);
/// ```
pub fn calculate_income_tax(
    taxable_base: Decimal,
    table: &StatutoryRateTable,
    step_number: u32,
) -> IncomeTaxResult {
    let scale = table.policy.currency_scale;

    // Tables are validated on load to be non-empty with an open top bracket.
    let (bracket_index, lower_bound, amount, bracket) =
        match find_bracket(&table.income_tax_brackets, taxable_base) {
            Some((index, lower)) => {
                let bracket = table.income_tax_brackets[index];
                let raw = bracket.base_amount + (taxable_base - lower) * bracket.marginal_rate;
                (index, lower, truncate_to_unit(raw, scale), Some(bracket))
            }
            None => (0, Decimal::ZERO, Decimal::ZERO, None),
        };

    let audit_step = AuditStep {
        step_number,
        rule_id: "income_tax".to_string(),
        rule_name: "Income Tax Withholding".to_string(),
        input: serde_json::json!({
            "taxable_base": taxable_base.to_string(),
            "effective_month": table.effective_month.to_string()
        }),
        output: serde_json::json!({
            "bracket_index": bracket_index,
            "lower_bound": lower_bound.to_string(),
            "upper_bound": bracket.and_then(|b| b.upper_bound).map(|u| u.to_string()),
            "amount": amount.to_string()
        }),
        reasoning: match bracket {
            Some(b) => format!(
                "Bracket {}: {} + ({} − {}) × {} = {}",
                bracket_index,
                b.base_amount,
                taxable_base,
                lower_bound,
                b.marginal_rate.normalize(),
                amount
            ),
            None => "No brackets defined; nothing withheld".to_string(),
        },
    };

    IncomeTaxResult {
        amount,
        bracket_index,
        audit_step,
    }
}
