//! Read-only projections of payroll runs.
//!
//! [`PayslipView`] is the per-employee payslip; [`ExtractRow`] is one row of
//! the monthly extraction handed to spreadsheet or document renderers.

mod extract;
mod payslip;

pub use extract::{ExtractRow, LineStatus, extract_rows, render_csv};
pub use payslip::{PayslipEmployee, PayslipItem, PayslipView};
