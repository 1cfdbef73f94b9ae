//! Calculation logic for the Payroll Engine.
//!
//! This module contains the pure payroll calculators: base hourly rate
//! derivation, base pay with proration, overtime and night premiums, the
//! weekly rest allowance, fixed allowances, statutory insurance and tax
//! deductions, and aggregation into a payroll line. Nothing here performs
//! I/O; the effective rate table is passed into every calculator.

mod aggregate;
mod allowances;
mod base_pay;
mod deductions;
mod fixed_allowances;
mod hourly_rate;
mod income_tax;
mod pipeline;
mod premium_pay;
mod rounding;
mod weekly_rest;

pub use aggregate::aggregate_line;
pub use allowances::{AllowanceBreakdown, calculate_allowances};
pub use base_pay::{BasePayResult, calculate_base_pay};
pub use deductions::{DeductionBreakdown, calculate_deductions, taxable_base};
pub use fixed_allowances::{FixedAllowancesResult, collect_fixed_allowances};
pub use hourly_rate::{HourlyRateResult, derive_hourly_rate};
pub use income_tax::{IncomeTaxResult, calculate_income_tax, find_bracket};
pub use pipeline::calculate_employee;
pub use premium_pay::{PremiumPayResult, calculate_night_pay, calculate_overtime_pay};
pub use rounding::truncate_to_unit;
pub use weekly_rest::{WeeklyRestResult, calculate_weekly_rest_allowance};
