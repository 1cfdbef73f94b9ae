//! Compensation profile model and related types.
//!
//! This module defines the [`CompensationProfile`] struct, the per-employee pay
//! configuration maintained by HR administrators, together with the enrollment
//! enums that decide which statutory deductions apply.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayMonth;
use crate::error::{EngineError, EngineResult};

/// How the employee's base wage is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// `base_wage` is an hourly rate.
    Hourly,
    /// `base_wage` is a monthly salary.
    Monthly,
}

/// A statutory social insurance scheme.
///
/// The declaration order is the order deductions are listed on payslips and
/// in exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    /// National pension.
    Pension,
    /// National health insurance.
    Health,
    /// Long-term care insurance.
    LongTermCare,
    /// Employment insurance.
    Employment,
}

impl InsuranceType {
    /// Every insurance type, in payslip order.
    pub const ALL: [InsuranceType; 4] = [
        InsuranceType::Pension,
        InsuranceType::Health,
        InsuranceType::LongTermCare,
        InsuranceType::Employment,
    ];
}

/// A withholding tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    /// Bracketed income tax.
    IncomeTax,
    /// Local income tax, a fixed share of the income tax.
    LocalTax,
}

/// A fixed monthly allowance and whether it is subject to withholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAllowance {
    /// The monthly amount, paid verbatim.
    pub amount: Decimal,
    /// Whether the amount counts toward the taxable base.
    #[serde(default = "default_taxable")]
    pub taxable: bool,
}

fn default_taxable() -> bool {
    true
}

impl FixedAllowance {
    /// A taxable allowance of the given amount.
    pub fn taxable(amount: Decimal) -> Self {
        Self {
            amount,
            taxable: true,
        }
    }

    /// A non-taxable allowance of the given amount.
    pub fn non_taxable(amount: Decimal) -> Self {
        Self {
            amount,
            taxable: false,
        }
    }
}

impl Default for FixedAllowance {
    fn default() -> Self {
        Self::taxable(Decimal::ZERO)
    }
}

/// The five fixed allowances carried on every profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAllowances {
    /// Meal allowance.
    #[serde(default)]
    pub meal: FixedAllowance,
    /// Transport allowance.
    #[serde(default)]
    pub transport: FixedAllowance,
    /// Position (duty) allowance.
    #[serde(default)]
    pub position: FixedAllowance,
    /// Hazard/risk allowance.
    #[serde(default)]
    pub risk: FixedAllowance,
    /// Long-service allowance.
    #[serde(default)]
    pub longevity: FixedAllowance,
}

/// An employee's pay configuration.
///
/// Profiles are mutable between runs. A payroll run never keeps a reference
/// to a profile; every line stores its own [`CompensationProfile`] clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationProfile {
    /// Unique identifier for the employee.
    pub employee_id: String,
    /// Display name shown on payslips.
    pub name: String,
    /// Department the employee belongs to.
    #[serde(default)]
    pub department: String,
    /// Job title.
    #[serde(default)]
    pub position: String,
    /// Whether `base_wage` is hourly or monthly.
    pub employment_type: EmploymentType,
    /// Hourly rate or monthly salary, depending on `employment_type`.
    pub base_wage: Decimal,
    /// Fixed monthly allowances.
    #[serde(default)]
    pub allowances: FixedAllowances,
    /// Overtime premium on top of the base hourly rate (0.5 = +50%).
    #[serde(default)]
    pub overtime_premium_rate: Decimal,
    /// Night-work premium on top of the base hourly rate.
    #[serde(default)]
    pub night_premium_rate: Decimal,
    /// Statutory insurances the employee contributes to.
    #[serde(default)]
    pub insurance_enrollment: BTreeSet<InsuranceType>,
    /// Withholding taxes that apply.
    #[serde(default)]
    pub tax_enrollment: BTreeSet<TaxType>,
    /// First day of employment.
    pub hire_date: NaiveDate,
    /// Last day of employment, if the employee has left or is leaving.
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
}

impl CompensationProfile {
    /// Returns true if the employee is employed for at least one day of `month`.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{CompensationProfile, EmploymentType, PayMonth};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let profile = CompensationProfile {
    ///     employee_id: "emp_001".to_string(),
    ///     name: "Kim Minji".to_string(),
    ///     department: "Nursing".to_string(),
    ///     position: "Care worker".to_string(),
    ///     employment_type: EmploymentType::Monthly,
    ///     base_wage: Decimal::from(2_500_000),
    ///     allowances: Default::default(),
    ///     overtime_premium_rate: Decimal::ZERO,
    ///     night_premium_rate: Decimal::ZERO,
    ///     insurance_enrollment: Default::default(),
    ///     tax_enrollment: Default::default(),
    ///     hire_date: NaiveDate::from_ymd_opt(2026, 3, 16).unwrap(),
    ///     termination_date: None,
    /// };
    ///
    /// assert!(profile.is_active_in("2026-03".parse::<PayMonth>().unwrap()));
    /// assert!(!profile.is_active_in("2026-02".parse::<PayMonth>().unwrap()));
    /// ```
    pub fn is_active_in(&self, month: PayMonth) -> bool {
        let hired_by_month_end = self.hire_date <= month.last_day();
        let still_employed = self
            .termination_date
            .is_none_or(|end| end >= month.first_day());
        hired_by_month_end && still_employed
    }

    /// Returns true if hire or termination falls part-way through `month`,
    /// which is what triggers proration of a monthly salary.
    pub fn is_partial_month(&self, month: PayMonth) -> bool {
        let hired_mid_month = month.contains(self.hire_date) && self.hire_date > month.first_day();
        let left_mid_month = self
            .termination_date
            .is_some_and(|end| month.contains(end) && end < month.last_day());
        hired_mid_month || left_mid_month
    }

    /// Returns true if the employee contributes to `insurance`.
    pub fn is_enrolled_in(&self, insurance: InsuranceType) -> bool {
        self.insurance_enrollment.contains(&insurance)
    }

    /// Returns true if `tax` is withheld for the employee.
    pub fn withholds(&self, tax: TaxType) -> bool {
        self.tax_enrollment.contains(&tax)
    }

    /// Checks the monetary fields are usable for calculation.
    ///
    /// Wages, premium rates and allowances must all be non-negative.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |field: &str, value: Decimal| EngineError::InvalidProfile {
            employee_id: self.employee_id.clone(),
            field: field.to_string(),
            message: format!("must not be negative (got {})", value),
        };

        if self.base_wage < Decimal::ZERO {
            return Err(invalid("base_wage", self.base_wage));
        }
        if self.overtime_premium_rate < Decimal::ZERO {
            return Err(invalid("overtime_premium_rate", self.overtime_premium_rate));
        }
        if self.night_premium_rate < Decimal::ZERO {
            return Err(invalid("night_premium_rate", self.night_premium_rate));
        }

        let allowances = [
            ("allowances.meal", self.allowances.meal),
            ("allowances.transport", self.allowances.transport),
            ("allowances.position", self.allowances.position),
            ("allowances.risk", self.allowances.risk),
            ("allowances.longevity", self.allowances.longevity),
        ];
        for (field, allowance) in allowances {
            if allowance.amount < Decimal::ZERO {
                return Err(invalid(field, allowance.amount));
            }
        }

        match self.termination_date {
            Some(end) if end < self.hire_date => Err(EngineError::InvalidProfile {
                employee_id: self.employee_id.clone(),
                field: "termination_date".to_string(),
                message: format!("{} is before hire date {}", end, self.hire_date),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> PayMonth {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_profile(employment_type: EmploymentType) -> CompensationProfile {
        CompensationProfile {
            employee_id: "emp_001".to_string(),
            name: "Kim Minji".to_string(),
            department: "Nursing".to_string(),
            position: "Care worker".to_string(),
            employment_type,
            base_wage: Decimal::from(12_000),
            allowances: FixedAllowances::default(),
            overtime_premium_rate: Decimal::new(5, 1),
            night_premium_rate: Decimal::new(5, 1),
            insurance_enrollment: InsuranceType::ALL.into_iter().collect(),
            tax_enrollment: [TaxType::IncomeTax, TaxType::LocalTax].into_iter().collect(),
            hire_date: date(2023, 6, 1),
            termination_date: None,
        }
    }

    #[test]
    fn test_deserialize_profile_with_defaults() {
        let json = r#"{
            "employee_id": "emp_002",
            "name": "Lee Jun",
            "employment_type": "monthly",
            "base_wage": "2500000",
            "hire_date": "2024-01-15"
        }"#;

        let profile: CompensationProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.employment_type, EmploymentType::Monthly);
        assert_eq!(profile.base_wage, Decimal::from(2_500_000));
        assert_eq!(profile.allowances, FixedAllowances::default());
        assert!(profile.insurance_enrollment.is_empty());
        assert!(profile.tax_enrollment.is_empty());
        assert_eq!(profile.termination_date, None);
    }

    #[test]
    fn test_deserialize_enrollment_sets_and_allowances() {
        let json = r#"{
            "employee_id": "emp_003",
            "name": "Park Seoyeon",
            "employment_type": "hourly",
            "base_wage": "12000",
            "allowances": {
                "meal": { "amount": "200000", "taxable": false },
                "position": { "amount": "50000" }
            },
            "insurance_enrollment": ["pension", "long_term_care"],
            "tax_enrollment": ["income_tax"],
            "hire_date": "2022-03-01"
        }"#;

        let profile: CompensationProfile = serde_json::from_str(json).unwrap();
        assert_eq!(
            profile.allowances.meal,
            FixedAllowance::non_taxable(Decimal::from(200_000))
        );
        assert_eq!(
            profile.allowances.position,
            FixedAllowance::taxable(Decimal::from(50_000))
        );
        assert!(profile.is_enrolled_in(InsuranceType::Pension));
        assert!(profile.is_enrolled_in(InsuranceType::LongTermCare));
        assert!(!profile.is_enrolled_in(InsuranceType::Health));
        assert!(profile.withholds(TaxType::IncomeTax));
        assert!(!profile.withholds(TaxType::LocalTax));
    }

    #[test]
    fn test_employment_type_serialization() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::Hourly).unwrap(),
            "\"hourly\""
        );
        assert_eq!(
            serde_json::to_string(&EmploymentType::Monthly).unwrap(),
            "\"monthly\""
        );
    }

    #[test]
    fn test_is_active_in_month_boundaries() {
        let mut profile = create_test_profile(EmploymentType::Monthly);
        profile.hire_date = date(2026, 3, 31);
        assert!(profile.is_active_in(month("2026-03")));
        assert!(!profile.is_active_in(month("2026-02")));

        profile.termination_date = Some(date(2026, 5, 1));
        assert!(profile.is_active_in(month("2026-05")));
        assert!(!profile.is_active_in(month("2026-06")));
    }

    #[test]
    fn test_is_partial_month_for_mid_month_hire() {
        let mut profile = create_test_profile(EmploymentType::Monthly);
        profile.hire_date = date(2026, 3, 16);
        assert!(profile.is_partial_month(month("2026-03")));
        assert!(!profile.is_partial_month(month("2026-04")));
    }

    #[test]
    fn test_is_partial_month_false_for_first_day_hire() {
        let mut profile = create_test_profile(EmploymentType::Monthly);
        profile.hire_date = date(2026, 3, 1);
        assert!(!profile.is_partial_month(month("2026-03")));
    }

    #[test]
    fn test_is_partial_month_for_mid_month_termination() {
        let mut profile = create_test_profile(EmploymentType::Monthly);
        profile.termination_date = Some(date(2026, 4, 10));
        assert!(profile.is_partial_month(month("2026-04")));

        profile.termination_date = Some(date(2026, 4, 30));
        assert!(!profile.is_partial_month(month("2026-04")));
    }

    #[test]
    fn test_validate_accepts_well_formed_profile() {
        let profile = create_test_profile(EmploymentType::Hourly);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_base_wage() {
        let mut profile = create_test_profile(EmploymentType::Hourly);
        profile.base_wage = Decimal::from(-1);

        match profile.validate() {
            Err(EngineError::InvalidProfile { field, .. }) => assert_eq!(field, "base_wage"),
            other => panic!("Expected InvalidProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_negative_allowance() {
        let mut profile = create_test_profile(EmploymentType::Monthly);
        profile.allowances.risk = FixedAllowance::taxable(Decimal::from(-10));

        match profile.validate() {
            Err(EngineError::InvalidProfile { field, .. }) => {
                assert_eq!(field, "allowances.risk")
            }
            other => panic!("Expected InvalidProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_termination_before_hire() {
        let mut profile = create_test_profile(EmploymentType::Monthly);
        profile.termination_date = Some(date(2023, 5, 31));

        match profile.validate() {
            Err(EngineError::InvalidProfile { field, .. }) => {
                assert_eq!(field, "termination_date")
            }
            other => panic!("Expected InvalidProfile, got {:?}", other),
        }
    }
}
