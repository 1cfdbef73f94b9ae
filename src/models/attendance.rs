//! Monthly attendance facts supplied by the attendance collaborator.
//!
//! The engine treats [`AttendanceFacts`] as read-only input: it validates the
//! record but never corrects it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayMonth;
use crate::error::{EngineError, EngineResult};

/// One employee's work facts for one month.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AttendanceFacts;
/// use rust_decimal::Decimal;
///
/// let facts = AttendanceFacts {
///     employee_id: "emp_001".to_string(),
///     month: "2026-01".parse().unwrap(),
///     work_days: 20,
///     regular_hours: Decimal::from(160),
///     overtime_hours: Decimal::from(10),
///     night_hours: Decimal::ZERO,
///     holiday_hours: Decimal::ZERO,
///     night_overtime_hours: Decimal::ZERO,
///     qualifies_for_weekly_rest_allowance: true,
/// };
///
/// assert!(facts.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceFacts {
    /// The employee these facts belong to.
    pub employee_id: String,
    /// The month the facts cover.
    pub month: PayMonth,
    /// Days actually worked in the month.
    pub work_days: u32,
    /// Hours worked at the ordinary rate.
    pub regular_hours: Decimal,
    /// Hours worked beyond the ordinary schedule.
    #[serde(default)]
    pub overtime_hours: Decimal,
    /// Hours worked in the night window.
    #[serde(default)]
    pub night_hours: Decimal,
    /// Hours worked on public holidays.
    #[serde(default)]
    pub holiday_hours: Decimal,
    /// Hours counted in both `overtime_hours` and `night_hours`.
    #[serde(default)]
    pub night_overtime_hours: Decimal,
    /// Whether attendance met the threshold for the weekly rest allowance.
    #[serde(default)]
    pub qualifies_for_weekly_rest_allowance: bool,
}

impl AttendanceFacts {
    /// Checks the hour buckets are usable for calculation.
    ///
    /// Negative hours are an upstream data error and are reported as
    /// [`EngineError::InvalidAttendance`]; they are never treated as zero.
    pub fn validate(&self) -> EngineResult<()> {
        let hours = [
            ("regular_hours", self.regular_hours),
            ("overtime_hours", self.overtime_hours),
            ("night_hours", self.night_hours),
            ("holiday_hours", self.holiday_hours),
            ("night_overtime_hours", self.night_overtime_hours),
        ];

        for (field, value) in hours {
            if value < Decimal::ZERO {
                return Err(self.invalid(field, format!("must not be negative (got {})", value)));
            }
        }

        if self.night_overtime_hours > self.overtime_hours
            || self.night_overtime_hours > self.night_hours
        {
            return Err(self.invalid(
                "night_overtime_hours",
                format!(
                    "{} exceeds overtime_hours {} or night_hours {}",
                    self.night_overtime_hours, self.overtime_hours, self.night_hours
                ),
            ));
        }

        Ok(())
    }

    fn invalid(&self, field: &str, message: String) -> EngineError {
        EngineError::InvalidAttendance {
            employee_id: self.employee_id.clone(),
            field: field.to_string(),
            message,
        }
    }
}
