//! Payslip projection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmploymentType, LineOutcome, NegativeNetPayWarning, PayMonth};
use crate::run::{PayrollRun, RunState};

/// Who the payslip is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipEmployee {
    /// Employee id.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Department.
    pub department: String,
    /// Job title.
    pub position: String,
    /// Hourly or monthly.
    pub employment_type: EmploymentType,
}

/// One labelled amount on a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipItem {
    /// Stable component code, e.g. `overtime_pay`.
    pub code: String,
    /// Human-readable label.
    pub label: String,
    /// The amount.
    pub amount: Decimal,
    /// Whether the amount is part of the taxable base (earnings only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
}

/// A payslip: one line plus the run and employee it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipView {
    /// The run.
    pub run_id: Uuid,
    /// The facility.
    pub facility_id: String,
    /// The month paid.
    pub target_month: PayMonth,
    /// The run's state; payslips of unlocked runs are provisional.
    pub run_state: RunState,
    /// The employee, from the profile snapshot taken at calculation.
    pub employee: PayslipEmployee,
    /// Earned components in payslip order.
    pub earnings: Vec<PayslipItem>,
    /// Deduction components in payslip order.
    pub deductions: Vec<PayslipItem>,
    /// Sum of taxable earnings.
    pub taxable_base: Decimal,
    /// Gross pay.
    pub total_pay: Decimal,
    /// Total deductions.
    pub total_deduction: Decimal,
    /// Net pay; may be negative.
    pub net_pay: Decimal,
    /// Present when net pay is negative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_net_pay: Option<NegativeNetPayWarning>,
}

impl PayslipView {
    /// Builds the payslip for one employee of a calculated or locked run.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTransition`] for a draft run.
    /// - [`EngineError::LineNotFound`] when the employee has no computed line.
    pub fn build(run: &PayrollRun, employee_id: &str) -> EngineResult<Self> {
        let lines = run
            .lines()
            .ok_or_else(|| run.invalid_transition("view payslips of"))?;
        let line = match lines.get(employee_id) {
            Some(LineOutcome::Calculated(line)) => line,
            _ => {
                return Err(EngineError::LineNotFound {
                    run_id: run.run_id(),
                    employee_id: employee_id.to_string(),
                });
            }
        };

        let header = run.header();
        let profile = &line.profile;

        let earnings = line
            .earnings
            .iter()
            .map(|(component, earned)| PayslipItem {
                code: component_code(component),
                label: component.label().to_string(),
                amount: earned.amount,
                taxable: Some(earned.taxable),
            })
            .collect();
        let deductions = line
            .deductions
            .iter()
            .map(|(component, amount)| PayslipItem {
                code: component_code(component),
                label: component.label().to_string(),
                amount: *amount,
                taxable: None,
            })
            .collect();

        Ok(Self {
            run_id: header.run_id,
            facility_id: header.facility_id.clone(),
            target_month: header.target_month,
            run_state: run.state(),
            employee: PayslipEmployee {
                employee_id: profile.employee_id.clone(),
                name: profile.name.clone(),
                department: profile.department.clone(),
                position: profile.position.clone(),
                employment_type: profile.employment_type,
            },
            earnings,
            deductions,
            taxable_base: line.taxable_base,
            total_pay: line.total_pay,
            total_deduction: line.total_deduction,
            net_pay: line.net_pay,
            negative_net_pay: line.negative_net_pay.clone(),
        })
    }
}

/// The serde name of a component, used as its stable code.
pub(crate) fn component_code<T: Serialize>(component: &T) -> String {
    match serde_json::to_value(component) {
        Ok(serde_json::Value::String(code)) => code,
        _ => String::new(),
    }
}
