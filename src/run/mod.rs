//! Payroll run lifecycle.
//!
//! A payroll run covers one facility and one target month and moves through
//! `Draft → Calculated → Locked`. The [`PayrollRun`] value carries the data
//! valid in each state; [`PayrollOrchestrator`] drives transitions and keeps
//! them mutually exclusive per run.

mod orchestrator;
mod state;
mod totals;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use orchestrator::{LockOutcome, PayrollOrchestrator};
pub use state::{CalculatedRun, DraftRun, LockedRun, PayrollRun, RunHeader, RunSummary};
pub use totals::{AccountingExport, ExportReceipt, ReversalEntry};

/// The lifecycle state of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created, or reopened; no lines, or lines discarded.
    Draft,
    /// Lines computed and reviewable.
    Calculated,
    /// Reflected to accounting. Terminal.
    Locked,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Draft => "draft",
            RunState::Calculated => "calculated",
            RunState::Locked => "locked",
        };
        f.write_str(name)
    }
}
