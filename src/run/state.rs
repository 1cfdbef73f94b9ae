//! Payroll run states and transitions.
//!
//! Each state is its own type. Transitions consume the current state and
//! return the next one, so a locked run has no way back to an editable
//! state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountingExport, ExportReceipt, ReversalEntry, RunState};
use crate::error::{EngineError, EngineResult};
use crate::models::{Acknowledgement, LineOutcome, PayMonth, PayrollLineResult};

/// Identity of a payroll run, shared by every state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHeader {
    /// Unique run id.
    pub run_id: Uuid,
    /// The facility being paid.
    pub facility_id: String,
    /// The month being paid.
    pub target_month: PayMonth,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

/// Line counts reported after calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Lines computed successfully.
    pub succeeded: usize,
    /// Lines that failed.
    pub failed: usize,
    /// Computed lines with negative net pay.
    pub negative_net_pay: usize,
}

impl RunSummary {
    fn of(lines: &BTreeMap<String, LineOutcome>) -> Self {
        lines.values().fold(Self::default(), |mut summary, outcome| {
            match outcome {
                LineOutcome::Calculated(line) => {
                    summary.succeeded += 1;
                    if line.negative_net_pay.is_some() {
                        summary.negative_net_pay += 1;
                    }
                }
                LineOutcome::Failed(_) => summary.failed += 1,
            }
            summary
        })
    }
}

/// A run awaiting calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRun {
    /// Run identity.
    pub header: RunHeader,
    /// Corrections of earlier locked runs booked into this run.
    #[serde(default)]
    pub reversals: Vec<ReversalEntry>,
}

impl DraftRun {
    /// Creates an empty draft run.
    pub fn new(facility_id: impl Into<String>, target_month: PayMonth) -> Self {
        Self {
            header: RunHeader {
                run_id: Uuid::new_v4(),
                facility_id: facility_id.into(),
                target_month,
                created_at: Utc::now(),
            },
            reversals: Vec::new(),
        }
    }

    /// Books a reversal of an earlier month's locked line into this run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidReversal`] if the source month is not
    /// earlier than this run's month, or the same line is already reversed.
    pub fn add_reversal(&mut self, entry: ReversalEntry) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidReversal {
            source_run_id: entry.source_run_id,
            employee_id: entry.employee_id.clone(),
            message,
        };

        if entry.source_month >= self.header.target_month {
            return Err(invalid(format!(
                "source month {} is not before {}",
                entry.source_month, self.header.target_month
            )));
        }
        let duplicate = self.reversals.iter().any(|r| {
            r.source_run_id == entry.source_run_id && r.employee_id == entry.employee_id
        });
        if duplicate {
            return Err(invalid("line is already reversed in this run".to_string()));
        }

        self.reversals.push(entry);
        Ok(())
    }

    /// Moves to `Calculated` with a fresh set of lines.
    pub fn into_calculated(
        self,
        lines: BTreeMap<String, LineOutcome>,
        rate_table_month: PayMonth,
    ) -> CalculatedRun {
        CalculatedRun {
            summary: RunSummary::of(&lines),
            header: self.header,
            reversals: self.reversals,
            rate_table_month,
            lines,
            export_pending: None,
        }
    }
}

/// A run with computed lines, open for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedRun {
    /// Run identity.
    pub header: RunHeader,
    /// Corrections of earlier locked runs booked into this run.
    #[serde(default)]
    pub reversals: Vec<ReversalEntry>,
    /// Effective month of the rate table the lines were computed with.
    pub rate_table_month: PayMonth,
    /// One outcome per active employee, keyed by employee id.
    pub lines: BTreeMap<String, LineOutcome>,
    /// Counts over `lines`.
    pub summary: RunSummary,
    /// An export sent to accounting whose outcome is unknown. While set, the
    /// run is frozen and a lock retry re-sends exactly these totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_pending: Option<AccountingExport>,
}

impl CalculatedRun {
    /// Goes back to `Draft`, discarding every line and acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ExportPending`] while an export awaits
    /// confirmation.
    pub fn reopen(self) -> EngineResult<DraftRun> {
        self.check_not_pending("reopen")?;
        Ok(DraftRun {
            header: self.header,
            reversals: self.reversals,
        })
    }

    /// Records an administrator's acknowledgement of a negative net pay line.
    pub fn acknowledge(
        &mut self,
        employee_id: &str,
        acknowledged_by: &str,
        acknowledged_at: DateTime<Utc>,
    ) -> EngineResult<&PayrollLineResult> {
        self.check_not_pending("acknowledge a line of")?;
        let run_id = self.header.run_id;
        let line = match self.lines.get_mut(employee_id) {
            Some(LineOutcome::Calculated(line)) => line,
            _ => {
                return Err(EngineError::LineNotFound {
                    run_id,
                    employee_id: employee_id.to_string(),
                });
            }
        };

        match line.negative_net_pay.as_mut() {
            Some(warning) if !warning.is_acknowledged() => {
                warning.acknowledgement = Some(Acknowledgement {
                    acknowledged_by: acknowledged_by.to_string(),
                    acknowledged_at,
                });
                Ok(&*line)
            }
            _ => Err(EngineError::NothingToAcknowledge {
                run_id,
                employee_id: employee_id.to_string(),
            }),
        }
    }

    /// Checks the lock preconditions: no failed lines, no unacknowledged
    /// negative net pay warnings.
    pub fn check_lockable(&self) -> EngineResult<()> {
        let failed_lines = self.lines.values().filter(|o| o.is_failed()).count();
        let unacknowledged_warnings = self
            .calculated_lines()
            .filter(|line| line.requires_acknowledgement())
            .count();

        if failed_lines > 0 || unacknowledged_warnings > 0 {
            return Err(EngineError::LockBlocked {
                run_id: self.header.run_id,
                failed_lines,
                unacknowledged_warnings,
            });
        }
        Ok(())
    }

    /// The totals a lock sends to accounting: the pending export when one is
    /// outstanding, otherwise the totals of the current lines.
    pub fn export_to_send(&self) -> AccountingExport {
        match &self.export_pending {
            Some(pending) => pending.clone(),
            None => self.accounting_export(),
        }
    }

    /// Freezes the run until `export` is confirmed by a retried lock.
    pub fn hold_export(&mut self, export: AccountingExport) {
        self.export_pending = Some(export);
    }

    fn check_not_pending(&self, action: &str) -> EngineResult<()> {
        match self.export_pending {
            Some(_) => Err(EngineError::ExportPending {
                run_id: self.header.run_id,
                action: action.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// The totals this run would reflect to accounting.
    pub fn accounting_export(&self) -> AccountingExport {
        AccountingExport::from_parts(
            self.header.run_id,
            &self.header.facility_id,
            self.header.target_month,
            self.calculated_lines(),
            &self.reversals,
        )
    }

    /// Moves to `Locked` once accounting has confirmed the export.
    pub fn into_locked(self, receipt: ExportReceipt, locked_at: DateTime<Utc>) -> LockedRun {
        LockedRun {
            export: self.export_to_send(),
            header: self.header,
            reversals: self.reversals,
            rate_table_month: self.rate_table_month,
            lines: self.lines,
            summary: self.summary,
            receipt,
            locked_at,
        }
    }

    fn calculated_lines(&self) -> impl Iterator<Item = &PayrollLineResult> {
        self.lines.values().filter_map(LineOutcome::as_calculated)
    }
}

/// A run reflected to accounting. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRun {
    /// Run identity.
    pub header: RunHeader,
    /// Corrections of earlier locked runs booked into this run.
    #[serde(default)]
    pub reversals: Vec<ReversalEntry>,
    /// Effective month of the rate table the lines were computed with.
    pub rate_table_month: PayMonth,
    /// The frozen lines.
    pub lines: BTreeMap<String, LineOutcome>,
    /// Counts over `lines`.
    pub summary: RunSummary,
    /// The totals that were exported.
    pub export: AccountingExport,
    /// The ledger's receipt.
    pub receipt: ExportReceipt,
    /// When the run was locked.
    pub locked_at: DateTime<Utc>,
}

impl LockedRun {
    /// Builds the reversal entry that cancels one employee's line.
    pub fn reversal_for(&self, employee_id: &str) -> EngineResult<ReversalEntry> {
        match self.lines.get(employee_id) {
            Some(LineOutcome::Calculated(line)) => {
                Ok(ReversalEntry::of_line(
                    self.header.run_id,
                    self.header.target_month,
                    line,
                ))
            }
            _ => Err(EngineError::LineNotFound {
                run_id: self.header.run_id,
                employee_id: employee_id.to_string(),
            }),
        }
    }
}

/// A payroll run in any state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PayrollRun {
    /// Awaiting calculation.
    Draft(DraftRun),
    /// Computed, under review.
    Calculated(CalculatedRun),
    /// Reflected to accounting.
    Locked(LockedRun),
}

impl PayrollRun {
    /// The run's identity.
    pub fn header(&self) -> &RunHeader {
        match self {
            PayrollRun::Draft(run) => &run.header,
            PayrollRun::Calculated(run) => &run.header,
            PayrollRun::Locked(run) => &run.header,
        }
    }

    /// The run id.
    pub fn run_id(&self) -> Uuid {
        self.header().run_id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> RunState {
        match self {
            PayrollRun::Draft(_) => RunState::Draft,
            PayrollRun::Calculated(_) => RunState::Calculated,
            PayrollRun::Locked(_) => RunState::Locked,
        }
    }

    /// The run's lines, if it has been calculated.
    pub fn lines(&self) -> Option<&BTreeMap<String, LineOutcome>> {
        match self {
            PayrollRun::Draft(_) => None,
            PayrollRun::Calculated(run) => Some(&run.lines),
            PayrollRun::Locked(run) => Some(&run.lines),
        }
    }

    /// Builds the error for `action` attempted in the current state.
    pub(crate) fn invalid_transition(&self, action: &str) -> EngineError {
        EngineError::InvalidTransition {
            run_id: self.run_id(),
            state: self.state(),
            action: action.to_string(),
        }
    }
}
