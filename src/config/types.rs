//! Configuration types for payroll calculation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files: facility settings and the
//! versioned statutory rate tables.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{InsuranceType, PayMonth};

/// Facility-level engine settings from `engine.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Identifier of the facility whose payroll is run.
    pub facility_id: String,
    /// Display name of the facility.
    pub facility_name: String,
    /// How long to wait for the accounting collaborator before giving up.
    #[serde(default = "default_export_timeout_ms")]
    pub export_timeout_ms: u64,
}

fn default_export_timeout_ms() -> u64 {
    5_000
}

/// Employee and employer contribution rates for one insurance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceRate {
    /// Share withheld from the employee, as a fraction of the taxable base.
    pub employee: Decimal,
    /// Share paid by the employer (informational; not deducted).
    #[serde(default)]
    pub employer: Decimal,
}

/// Contribution rates for every insurance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceRates {
    /// National pension.
    pub pension: InsuranceRate,
    /// Health insurance.
    pub health: InsuranceRate,
    /// Long-term care insurance.
    pub long_term_care: InsuranceRate,
    /// Employment insurance.
    pub employment: InsuranceRate,
}

impl InsuranceRates {
    /// The rates for one insurance type.
    pub fn rate(&self, insurance: InsuranceType) -> InsuranceRate {
        match insurance {
            InsuranceType::Pension => self.pension,
            InsuranceType::Health => self.health,
            InsuranceType::LongTermCare => self.long_term_care,
            InsuranceType::Employment => self.employment,
        }
    }
}

/// One row of the income tax withholding table.
///
/// A bracket covers taxable bases above the previous bracket's upper bound
/// up to and including its own `upper_bound`. Withholding within the bracket
/// is `base_amount + (base - lower_bound) * marginal_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive upper bound; `None` for the open-ended top bracket.
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    /// Withholding at the bracket's lower bound.
    pub base_amount: Decimal,
    /// Withholding per unit of base above the lower bound.
    #[serde(default)]
    pub marginal_rate: Decimal,
}

/// Wage policy parameters that vary with labor regulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagePolicy {
    /// Work days in a standard month, the proration denominator.
    pub standard_monthly_work_days: Decimal,
    /// Paid hours in a standard month, used to derive a monthly employee's hourly rate.
    pub standard_monthly_hours: Decimal,
    /// Hours paid as weekly rest allowance when the employee qualifies.
    pub standard_weekly_rest_hours: Decimal,
    /// Decimal places of the smallest currency unit amounts are truncated to.
    #[serde(default)]
    pub currency_scale: u32,
}

/// A statutory rate table, effective from `effective_month` until superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryRateTable {
    /// The first month this table applies to.
    pub effective_month: PayMonth,
    /// Insurance contribution rates.
    pub insurance: InsuranceRates,
    /// Income tax withholding table, ascending by upper bound.
    pub income_tax_brackets: Vec<TaxBracket>,
    /// Local tax as a fraction of the computed income tax.
    pub local_tax_rate: Decimal,
    /// Policy parameters for allowance calculation.
    pub policy: WagePolicy,
}

impl StatutoryRateTable {
    /// Checks the table is internally consistent.
    ///
    /// Rates must lie in `[0, 1]`, brackets must be strictly ascending with
    /// only the last one open-ended, withholding must never decrease as the
    /// base grows, and the policy divisors must be positive.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidRateTable {
            effective_month: self.effective_month,
            message,
        };
        let is_fraction = |rate: Decimal| rate >= Decimal::ZERO && rate <= Decimal::ONE;

        for insurance in InsuranceType::ALL {
            let rate = self.insurance.rate(insurance);
            if !is_fraction(rate.employee) || !is_fraction(rate.employer) {
                return Err(invalid(format!(
                    "{:?} rates must be between 0 and 1",
                    insurance
                )));
            }
        }

        if !is_fraction(self.local_tax_rate) {
            return Err(invalid("local_tax_rate must be between 0 and 1".to_string()));
        }

        if self.policy.standard_monthly_work_days <= Decimal::ZERO
            || self.policy.standard_monthly_hours <= Decimal::ZERO
        {
            return Err(invalid(
                "standard_monthly_work_days and standard_monthly_hours must be positive"
                    .to_string(),
            ));
        }
        if self.policy.standard_weekly_rest_hours < Decimal::ZERO {
            return Err(invalid(
                "standard_weekly_rest_hours must not be negative".to_string(),
            ));
        }

        self.validate_brackets().map_err(invalid)
    }

    fn validate_brackets(&self) -> Result<(), String> {
        let brackets = &self.income_tax_brackets;
        let Some(last) = brackets.last() else {
            return Err("income_tax_brackets must not be empty".to_string());
        };
        if last.upper_bound.is_some() {
            return Err("the last income tax bracket must be open-ended".to_string());
        }

        let mut lower = Decimal::ZERO;
        let mut withholding_at_lower = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.marginal_rate < Decimal::ZERO || bracket.base_amount < Decimal::ZERO {
                return Err(format!("bracket {} has a negative amount or rate", index));
            }
            if bracket.base_amount < withholding_at_lower {
                return Err(format!(
                    "bracket {} withholding {} is lower than the preceding bracket's {}",
                    index, bracket.base_amount, withholding_at_lower
                ));
            }

            match bracket.upper_bound {
                Some(upper) if upper <= lower => {
                    return Err(format!(
                        "bracket {} upper bound {} does not exceed {}",
                        index, upper, lower
                    ));
                }
                Some(upper) => {
                    withholding_at_lower =
                        bracket.base_amount + (upper - lower) * bracket.marginal_rate;
                    lower = upper;
                }
                None if index + 1 != brackets.len() => {
                    return Err(format!("bracket {} is open-ended but not last", index));
                }
                None => {}
            }
        }

        Ok(())
    }
}

/// Every published rate table, sorted by effective month (oldest first).
#[derive(Debug, Clone, Default)]
pub struct RateTableSet {
    tables: Vec<Arc<StatutoryRateTable>>,
}

impl RateTableSet {
    /// Builds a set from individual tables, validating each one.
    ///
    /// Two tables with the same effective month are rejected.
    pub fn new(tables: Vec<StatutoryRateTable>) -> EngineResult<Self> {
        let mut sorted = tables;
        sorted.sort_by(|a, b| a.effective_month.cmp(&b.effective_month));

        for table in &sorted {
            table.validate()?;
        }
        for pair in sorted.windows(2) {
            if pair[0].effective_month == pair[1].effective_month {
                return Err(EngineError::InvalidRateTable {
                    effective_month: pair[1].effective_month,
                    message: "more than one table is published for this month".to_string(),
                });
            }
        }

        Ok(Self {
            tables: sorted.into_iter().map(Arc::new).collect(),
        })
    }

    /// Finds the table in force for `month`: the most recent one whose
    /// effective month is on or before it.
    pub fn effective_for(&self, month: PayMonth) -> EngineResult<Arc<StatutoryRateTable>> {
        self.tables
            .iter()
            .rfind(|t| t.effective_month <= month)
            .cloned()
            .ok_or(EngineError::MissingRateTable { month })
    }

    /// The effective months of every published table.
    pub fn versions(&self) -> Vec<PayMonth> {
        self.tables.iter().map(|t| t.effective_month).collect()
    }

    /// Returns true if no table has been published.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    settings: EngineSettings,
    rate_tables: RateTableSet,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(settings: EngineSettings, rate_tables: RateTableSet) -> Self {
        Self {
            settings,
            rate_tables,
        }
    }

    /// Returns the facility settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the published rate tables.
    pub fn rate_tables(&self) -> &RateTableSet {
        &self.rate_tables
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rate(employee: &str) -> InsuranceRate {
        InsuranceRate {
            employee: dec(employee),
            employer: dec(employee),
        }
    }

    /// A synthetic table used across unit tests.
    ///
    /// Brackets: 0..=1,060,000 → 0; ..=3,000,000 → 0 + 2% above 1,060,000;
    /// ..=5,000,000 → 38,800 + 5% above 3,000,000; above → 138,800 + 10%.
    pub(crate) fn sample_rate_table(month: &str) -> StatutoryRateTable {
        StatutoryRateTable {
            effective_month: month.parse().unwrap(),
            insurance: InsuranceRates {
                pension: rate("0.045"),
                health: rate("0.03545"),
                long_term_care: rate("0.00459"),
                employment: rate("0.009"),
            },
            income_tax_brackets: vec![
                TaxBracket {
                    upper_bound: Some(dec("1060000")),
                    base_amount: dec("0"),
                    marginal_rate: dec("0"),
                },
                TaxBracket {
                    upper_bound: Some(dec("3000000")),
                    base_amount: dec("0"),
                    marginal_rate: dec("0.02"),
                },
                TaxBracket {
                    upper_bound: Some(dec("5000000")),
                    base_amount: dec("38800"),
                    marginal_rate: dec("0.05"),
                },
                TaxBracket {
                    upper_bound: None,
                    base_amount: dec("138800"),
                    marginal_rate: dec("0.1"),
                },
            ],
            local_tax_rate: dec("0.1"),
            policy: WagePolicy {
                standard_monthly_work_days: dec("22"),
                standard_monthly_hours: dec("209"),
                standard_weekly_rest_hours: dec("35"),
                currency_scale: 0,
            },
        }
    }
}
