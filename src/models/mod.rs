//! Core data models for the Payroll Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod pay_month;
mod payroll_line;
mod profile;

pub use attendance::AttendanceFacts;
pub use pay_month::PayMonth;
pub use payroll_line::{
    Acknowledgement, AuditStep, DeductionComponent, EarnedAmount, EarningComponent, FailedLine,
    LineOutcome, NegativeNetPayWarning, PayrollLineResult,
};
pub use profile::{
    CompensationProfile, EmploymentType, FixedAllowance, FixedAllowances, InsuranceType, TaxType,
};
