//! Accounting totals and reversal entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DeductionComponent, PayMonth, PayrollLineResult};

/// The totals reflected to accounting when a run is locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingExport {
    /// The run being reflected; the ledger deduplicates on it.
    pub run_id: Uuid,
    /// The facility the run belongs to.
    pub facility_id: String,
    /// The month the run pays.
    pub target_month: PayMonth,
    /// Number of calculated lines.
    pub employee_count: usize,
    /// Gross pay across lines, net of reversals.
    pub total_gross_pay: Decimal,
    /// Deductions per component; all six keys are present.
    pub deductions_by_category: BTreeMap<DeductionComponent, Decimal>,
    /// Sum of `deductions_by_category`.
    pub total_deduction: Decimal,
    /// Net pay across lines, net of reversals.
    pub total_net_pay: Decimal,
    /// Number of reversal entries folded into the totals.
    pub reversal_count: usize,
}

/// The accounting collaborator's acknowledgement of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReceipt {
    /// The exported run.
    pub run_id: Uuid,
    /// The ledger's own reference for the posting.
    pub ledger_reference: String,
    /// When the ledger recorded the posting.
    pub recorded_at: DateTime<Utc>,
}

/// A correction of a locked line, booked into a later month's run.
///
/// Every amount is the negation of the source line's amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalEntry {
    /// The locked run that holds the original line.
    pub source_run_id: Uuid,
    /// The month the original line paid.
    pub source_month: PayMonth,
    /// The employee whose line is reversed.
    pub employee_id: String,
    /// Negated gross pay.
    pub gross_pay: Decimal,
    /// Negated deductions per component.
    pub deductions: BTreeMap<DeductionComponent, Decimal>,
    /// Negated net pay.
    pub net_pay: Decimal,
}

impl ReversalEntry {
    /// Builds the reversal of a locked line.
    pub fn of_line(source_run_id: Uuid, source_month: PayMonth, line: &PayrollLineResult) -> Self {
        Self {
            source_run_id,
            source_month,
            employee_id: line.employee_id.clone(),
            gross_pay: -line.total_pay,
            deductions: line
                .deductions
                .iter()
                .map(|(component, amount)| (*component, -*amount))
                .collect(),
            net_pay: -line.net_pay,
        }
    }
}

impl AccountingExport {
    /// Sums calculated lines and reversal entries into export totals.
    pub(crate) fn from_parts<'a>(
        run_id: Uuid,
        facility_id: &str,
        target_month: PayMonth,
        lines: impl Iterator<Item = &'a PayrollLineResult>,
        reversals: &[ReversalEntry],
    ) -> Self {
        let mut deductions_by_category: BTreeMap<DeductionComponent, Decimal> =
            DeductionComponent::ALL
                .into_iter()
                .map(|c| (c, Decimal::ZERO))
                .collect();
        let mut employee_count = 0;
        let mut total_gross_pay = Decimal::ZERO;
        let mut total_net_pay = Decimal::ZERO;

        for line in lines {
            employee_count += 1;
            total_gross_pay += line.total_pay;
            total_net_pay += line.net_pay;
            for (component, amount) in &line.deductions {
                *deductions_by_category.entry(*component).or_default() += *amount;
            }
        }

        for reversal in reversals {
            total_gross_pay += reversal.gross_pay;
            total_net_pay += reversal.net_pay;
            for (component, amount) in &reversal.deductions {
                *deductions_by_category.entry(*component).or_default() += *amount;
            }
        }

        let total_deduction: Decimal = deductions_by_category.values().copied().sum();

        Self {
            run_id,
            facility_id: facility_id.to_string(),
            target_month,
            employee_count,
            total_gross_pay,
            deductions_by_category,
            total_deduction,
            total_net_pay,
            reversal_count: reversals.len(),
        }
    }
}
