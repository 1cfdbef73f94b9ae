//! Payroll line models for the Payroll Engine.
//!
//! This module contains the [`PayrollLineResult`] type and its associated
//! structures that capture everything computed for one employee in one run:
//! earned components, statutory deductions, totals, warnings and an audit
//! trace of every rule that was applied.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AttendanceFacts, CompensationProfile, EmploymentType, InsuranceType};
use crate::error::EngineError;

/// A named earned-pay component.
///
/// The declaration order is the order components appear on payslips and in
/// the monthly extraction.
///
/// # Example
///
/// ```
/// use payroll_engine::models::EarningComponent;
///
/// let component = EarningComponent::WeeklyRestAllowance;
/// assert_eq!(component.label(), "Weekly rest allowance");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningComponent {
    /// Ordinary pay for regular (and holiday) hours, or the monthly salary.
    BasePay,
    /// Overtime hours at the overtime premium.
    OvertimePay,
    /// Night hours at the night premium.
    NightPay,
    /// Paid weekly rest, gated on attendance.
    WeeklyRestAllowance,
    /// Fixed meal allowance.
    MealAllowance,
    /// Fixed transport allowance.
    TransportAllowance,
    /// Fixed position allowance.
    PositionAllowance,
    /// Fixed risk allowance.
    RiskAllowance,
    /// Fixed long-service allowance.
    LongevityAllowance,
}

impl EarningComponent {
    /// Every earned component, in payslip order.
    pub const ALL: [EarningComponent; 9] = [
        EarningComponent::BasePay,
        EarningComponent::OvertimePay,
        EarningComponent::NightPay,
        EarningComponent::WeeklyRestAllowance,
        EarningComponent::MealAllowance,
        EarningComponent::TransportAllowance,
        EarningComponent::PositionAllowance,
        EarningComponent::RiskAllowance,
        EarningComponent::LongevityAllowance,
    ];

    /// Human-readable name used on payslips.
    pub fn label(&self) -> &'static str {
        match self {
            EarningComponent::BasePay => "Base pay",
            EarningComponent::OvertimePay => "Overtime pay",
            EarningComponent::NightPay => "Night pay",
            EarningComponent::WeeklyRestAllowance => "Weekly rest allowance",
            EarningComponent::MealAllowance => "Meal allowance",
            EarningComponent::TransportAllowance => "Transport allowance",
            EarningComponent::PositionAllowance => "Position allowance",
            EarningComponent::RiskAllowance => "Risk allowance",
            EarningComponent::LongevityAllowance => "Longevity allowance",
        }
    }
}

/// A named statutory deduction component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionComponent {
    /// National pension, employee share.
    Pension,
    /// Health insurance, employee share.
    Health,
    /// Long-term care insurance, employee share.
    LongTermCare,
    /// Employment insurance, employee share.
    Employment,
    /// Withheld income tax.
    IncomeTax,
    /// Local income tax.
    LocalTax,
}

impl DeductionComponent {
    /// Every deduction component, in payslip order.
    pub const ALL: [DeductionComponent; 6] = [
        DeductionComponent::Pension,
        DeductionComponent::Health,
        DeductionComponent::LongTermCare,
        DeductionComponent::Employment,
        DeductionComponent::IncomeTax,
        DeductionComponent::LocalTax,
    ];

    /// Human-readable name used on payslips.
    pub fn label(&self) -> &'static str {
        match self {
            DeductionComponent::Pension => "National pension",
            DeductionComponent::Health => "Health insurance",
            DeductionComponent::LongTermCare => "Long-term care insurance",
            DeductionComponent::Employment => "Employment insurance",
            DeductionComponent::IncomeTax => "Income tax",
            DeductionComponent::LocalTax => "Local income tax",
        }
    }
}

impl From<InsuranceType> for DeductionComponent {
    fn from(insurance: InsuranceType) -> Self {
        match insurance {
            InsuranceType::Pension => DeductionComponent::Pension,
            InsuranceType::Health => DeductionComponent::Health,
            InsuranceType::LongTermCare => DeductionComponent::LongTermCare,
            InsuranceType::Employment => DeductionComponent::Employment,
        }
    }
}

/// An earned amount and whether it belongs to the taxable base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedAmount {
    /// The amount earned.
    pub amount: Decimal,
    /// Whether the amount is subject to insurance and tax withholding.
    pub taxable: bool,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// Who acknowledged a warning, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// The administrator who acknowledged the warning.
    pub acknowledged_by: String,
    /// When the acknowledgement was recorded.
    pub acknowledged_at: DateTime<Utc>,
}

/// Raised when deductions exceed gross pay.
///
/// The negative net pay is kept as-is. A run holding an unacknowledged
/// warning cannot be locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeNetPayWarning {
    /// The (negative) net pay that triggered the warning.
    pub net_pay: Decimal,
    /// Set once an administrator has acknowledged the warning.
    #[serde(default)]
    pub acknowledgement: Option<Acknowledgement>,
}

impl NegativeNetPayWarning {
    /// Returns true if an administrator has acknowledged the warning.
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledgement.is_some()
    }
}

/// The computed payroll for one employee in one run.
///
/// Owns a frozen copy of the profile and attendance it was computed from,
/// keyed by `run_id` + `employee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollLineResult {
    /// The run this line belongs to.
    pub run_id: Uuid,
    /// The employee this line pays.
    pub employee_id: String,
    /// Snapshot of the profile at calculation time.
    pub profile: CompensationProfile,
    /// Snapshot of the attendance facts used.
    pub attendance: AttendanceFacts,
    /// Earned components.
    pub earnings: BTreeMap<EarningComponent, EarnedAmount>,
    /// Deduction components; all six keys are always present.
    pub deductions: BTreeMap<DeductionComponent, Decimal>,
    /// Sum of taxable earnings.
    pub taxable_base: Decimal,
    /// Sum of all earnings.
    pub total_pay: Decimal,
    /// Sum of all deductions.
    pub total_deduction: Decimal,
    /// `total_pay - total_deduction`; may be negative.
    pub net_pay: Decimal,
    /// Present when `net_pay` is negative.
    #[serde(default)]
    pub negative_net_pay: Option<NegativeNetPayWarning>,
    /// Every rule applied while computing this line.
    pub audit_trace: Vec<AuditStep>,
}

impl PayrollLineResult {
    /// The amount earned for a component, zero when absent.
    pub fn earning(&self, component: EarningComponent) -> Decimal {
        self.earnings
            .get(&component)
            .map(|e| e.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// The amount withheld for a component.
    pub fn deduction(&self, component: DeductionComponent) -> Decimal {
        self.deductions
            .get(&component)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Returns true if the line carries a warning nobody has acknowledged yet.
    pub fn requires_acknowledgement(&self) -> bool {
        self.negative_net_pay
            .as_ref()
            .is_some_and(|w| !w.is_acknowledged())
    }
}

/// An employee whose line could not be computed.
///
/// Carries the identity fields of the profile so the employee can still be
/// named on extracts and review screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLine {
    /// The employee whose calculation failed.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Department.
    pub department: String,
    /// Job position.
    pub position: String,
    /// Hourly or monthly pay basis.
    pub employment_type: EmploymentType,
    /// Machine-readable error code (e.g. `INVALID_ATTENDANCE`).
    pub error_code: String,
    /// Human-readable reason.
    pub reason: String,
}

impl FailedLine {
    /// Records `error` as the failure of `profile`'s line.
    pub fn of(profile: &CompensationProfile, error: &EngineError) -> Self {
        Self {
            employee_id: profile.employee_id.clone(),
            name: profile.name.clone(),
            department: profile.department.clone(),
            position: profile.position.clone(),
            employment_type: profile.employment_type,
            error_code: error.code().to_string(),
            reason: error.to_string(),
        }
    }
}

/// The outcome of calculating one employee within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineOutcome {
    /// The line was computed.
    Calculated(PayrollLineResult),
    /// The line failed and blocks locking until recalculated.
    Failed(FailedLine),
}

impl LineOutcome {
    /// The employee this outcome belongs to.
    pub fn employee_id(&self) -> &str {
        match self {
            LineOutcome::Calculated(line) => &line.employee_id,
            LineOutcome::Failed(failed) => &failed.employee_id,
        }
    }

    /// The computed line, if the calculation succeeded.
    pub fn as_calculated(&self) -> Option<&PayrollLineResult> {
        match self {
            LineOutcome::Calculated(line) => Some(line),
            LineOutcome::Failed(_) => None,
        }
    }

    /// Returns true if the calculation failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, LineOutcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earning_component_serialization() {
        assert_eq!(
            serde_json::to_string(&EarningComponent::WeeklyRestAllowance).unwrap(),
            "\"weekly_rest_allowance\""
        );
        let component: EarningComponent = serde_json::from_str("\"base_pay\"").unwrap();
        assert_eq!(component, EarningComponent::BasePay);
    }

    #[test]
    fn test_deduction_component_from_insurance_type() {
        assert_eq!(
            DeductionComponent::from(InsuranceType::LongTermCare),
            DeductionComponent::LongTermCare
        );
        assert_eq!(
            DeductionComponent::from(InsuranceType::Employment),
            DeductionComponent::Employment
        );
    }

    #[test]
    fn test_component_order_matches_payslip_order() {
        let mut sorted = EarningComponent::ALL;
        sorted.sort();
        assert_eq!(sorted, EarningComponent::ALL);

        let mut sorted = DeductionComponent::ALL;
        sorted.sort();
        assert_eq!(sorted, DeductionComponent::ALL);
    }

    #[test]
    fn test_deduction_map_serializes_with_string_keys() {
        let deductions: BTreeMap<DeductionComponent, Decimal> = DeductionComponent::ALL
            .into_iter()
            .map(|c| (c, Decimal::ZERO))
            .collect();

        let json = serde_json::to_value(&deductions).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 6);
        assert!(json.get("long_term_care").is_some());
        assert!(json.get("local_tax").is_some());
    }

    fn profile(employee_id: &str) -> CompensationProfile {
        CompensationProfile {
            employee_id: employee_id.to_string(),
            name: "Park Jisoo".to_string(),
            department: "Kitchen".to_string(),
            position: "Cook".to_string(),
            employment_type: EmploymentType::Monthly,
            base_wage: Decimal::from(2_400_000),
            allowances: Default::default(),
            overtime_premium_rate: Decimal::new(5, 1),
            night_premium_rate: Decimal::new(5, 1),
            insurance_enrollment: Default::default(),
            tax_enrollment: Default::default(),
            hire_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            termination_date: None,
        }
    }

    #[test]
    fn test_failed_outcome_is_tagged_with_status() {
        let error = EngineError::InvalidAttendance {
            employee_id: "emp_009".to_string(),
            field: "overtime_hours".to_string(),
            message: "must not be negative".to_string(),
        };
        let outcome = LineOutcome::Failed(FailedLine::of(&profile("emp_009"), &error));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["employee_id"], "emp_009");
        assert_eq!(json["name"], "Park Jisoo");
        assert_eq!(json["department"], "Kitchen");
        assert_eq!(json["employment_type"], "monthly");
        assert_eq!(json["error_code"], "INVALID_ATTENDANCE");
        assert!(outcome.is_failed());
        assert_eq!(outcome.employee_id(), "emp_009");
        assert!(outcome.as_calculated().is_none());
    }

    #[test]
    fn test_warning_acknowledgement_state() {
        let mut warning = NegativeNetPayWarning {
            net_pay: Decimal::from(-1_000),
            acknowledgement: None,
        };
        assert!(!warning.is_acknowledged());

        warning.acknowledgement = Some(Acknowledgement {
            acknowledged_by: "hr_admin".to_string(),
            acknowledged_at: Utc::now(),
        });
        assert!(warning.is_acknowledged());
    }
}
