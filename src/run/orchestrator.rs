//! The payroll run orchestrator.
//!
//! Owns every run, serializes transitions per run, fans employee
//! calculations out across tasks and reflects locked runs to accounting.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};
use uuid::Uuid;

use super::{DraftRun, LockedRun, PayrollRun};
use crate::calculation::calculate_employee;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{CompensationProfile, FailedLine, LineOutcome, PayMonth, PayrollLineResult};
use crate::store::{AccountingExporter, AttendanceProvider, ProfileStore};

/// The result of a lock request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "run", rename_all = "snake_case")]
pub enum LockOutcome {
    /// The run was exported and locked by this request.
    Locked(LockedRun),
    /// The run was already locked; nothing was exported.
    AlreadyLocked(LockedRun),
}

impl LockOutcome {
    /// The locked run.
    pub fn run(&self) -> &LockedRun {
        match self {
            LockOutcome::Locked(run) | LockOutcome::AlreadyLocked(run) => run,
        }
    }
}

type RunSlot = Arc<Mutex<PayrollRun>>;

/// Drives payroll runs through `Draft → Calculated → Locked` for one facility.
///
/// Each run sits behind its own async mutex, held for the full duration of
/// a transition including the accounting export. Different runs proceed
/// independently.
pub struct PayrollOrchestrator {
    config: Arc<EngineConfig>,
    profiles: Arc<dyn ProfileStore>,
    attendance: Arc<dyn AttendanceProvider>,
    exporter: Arc<dyn AccountingExporter>,
    runs: RwLock<HashMap<Uuid, RunSlot>>,
    by_month: RwLock<HashMap<PayMonth, Uuid>>,
    reversed: Mutex<HashSet<(Uuid, String)>>,
}

impl PayrollOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        config: Arc<EngineConfig>,
        profiles: Arc<dyn ProfileStore>,
        attendance: Arc<dyn AttendanceProvider>,
        exporter: Arc<dyn AccountingExporter>,
    ) -> Self {
        Self {
            config,
            profiles,
            attendance,
            exporter,
            runs: RwLock::new(HashMap::new()),
            by_month: RwLock::new(HashMap::new()),
            reversed: Mutex::new(HashSet::new()),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The profile store.
    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// The attendance provider.
    pub fn attendance(&self) -> &Arc<dyn AttendanceProvider> {
        &self.attendance
    }

    /// Creates a draft run for `target_month`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RunAlreadyExists`] if the facility already has
    /// a run for the month.
    pub async fn create_run(&self, target_month: PayMonth) -> EngineResult<PayrollRun> {
        let facility_id = &self.config.settings().facility_id;
        let mut by_month = self.by_month.write().await;

        if let Some(existing) = by_month.get(&target_month) {
            return Err(EngineError::RunAlreadyExists {
                facility_id: facility_id.clone(),
                month: target_month,
                existing_run_id: *existing,
            });
        }

        let run = PayrollRun::Draft(DraftRun::new(facility_id.clone(), target_month));
        let run_id = run.run_id();
        by_month.insert(target_month, run_id);
        self.runs
            .write()
            .await
            .insert(run_id, Arc::new(Mutex::new(run.clone())));

        info!(run_id = %run_id, target_month = %target_month, "Created payroll run");
        Ok(run)
    }

    /// Returns a snapshot of a run.
    pub async fn get_run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        let slot = self.slot(run_id).await?;
        let run = slot.lock().await;
        Ok(run.clone())
    }

    /// Calculates every active employee's line: `Draft → Calculated`.
    ///
    /// The rate table is resolved before any employee is touched; when none
    /// is effective the run stays `Draft`. Per-employee problems become
    /// failed lines and do not abort the run.
    pub async fn calculate(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        let slot = self.slot(run_id).await?;
        let mut run = slot.lock().await;

        let draft = match &*run {
            PayrollRun::Draft(draft) => draft.clone(),
            other => return Err(other.invalid_transition("calculate")),
        };

        let start = Instant::now();
        let month = draft.header.target_month;
        let table = self.config.rate_tables().effective_for(month)?;

        let profiles = self.profiles.list_profiles().await?;
        let mut tasks = JoinSet::new();
        let mut employees: HashMap<tokio::task::Id, CompensationProfile> = HashMap::new();
        for profile in profiles.into_iter().filter(|p| p.is_active_in(month)) {
            let attendance = self
                .attendance
                .get_attendance(&profile.employee_id, month)
                .await?;
            let table = Arc::clone(&table);
            let task_profile = profile.clone();
            let handle = tasks.spawn(async move {
                calculate_employee(run_id, &task_profile, attendance.as_ref(), month, &table)
            });
            employees.insert(handle.id(), profile);
        }

        let mut lines = BTreeMap::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(error) => match employees.get(&error.id()) {
                    Some(profile) => task_failure(run_id, profile, &error),
                    None => {
                        return Err(EngineError::CalculationError {
                            message: format!("unattributed calculation task failed: {}", error),
                        });
                    }
                },
            };
            lines.insert(outcome.employee_id().to_string(), outcome);
        }

        let calculated = draft.into_calculated(lines, table.effective_month);
        info!(
            run_id = %run_id,
            target_month = %month,
            rate_table = %table.effective_month,
            succeeded = calculated.summary.succeeded,
            failed = calculated.summary.failed,
            negative_net_pay = calculated.summary.negative_net_pay,
            duration_us = start.elapsed().as_micros() as u64,
            "Calculated payroll run"
        );

        *run = PayrollRun::Calculated(calculated);
        Ok(run.clone())
    }

    /// Returns a calculated run to `Draft`, discarding its lines.
    ///
    /// Refused with [`EngineError::ExportPending`] while an export awaits
    /// confirmation.
    pub async fn reopen(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        let slot = self.slot(run_id).await?;
        let mut run = slot.lock().await;

        let calculated = match &*run {
            PayrollRun::Calculated(calculated) => calculated.clone(),
            other => return Err(other.invalid_transition("reopen")),
        };

        *run = PayrollRun::Draft(calculated.reopen()?);
        info!(run_id = %run_id, "Reopened payroll run");
        Ok(run.clone())
    }

    /// Acknowledges one employee's negative net pay warning.
    pub async fn acknowledge(
        &self,
        run_id: Uuid,
        employee_id: &str,
        acknowledged_by: &str,
    ) -> EngineResult<PayrollLineResult> {
        let slot = self.slot(run_id).await?;
        let mut run = slot.lock().await;

        let line = match &mut *run {
            PayrollRun::Calculated(calculated) => calculated
                .acknowledge(employee_id, acknowledged_by, Utc::now())?
                .clone(),
            other => return Err(other.invalid_transition("acknowledge")),
        };
        info!(
            run_id = %run_id,
            employee_id = %employee_id,
            acknowledged_by = %acknowledged_by,
            net_pay = %line.net_pay,
            "Acknowledged negative net pay"
        );
        Ok(line)
    }

    /// Books the reversal of a locked run's line into a draft run.
    pub async fn add_reversal(
        &self,
        run_id: Uuid,
        source_run_id: Uuid,
        employee_id: &str,
    ) -> EngineResult<PayrollRun> {
        let entry = match self.get_run(source_run_id).await? {
            PayrollRun::Locked(source) => source.reversal_for(employee_id)?,
            other => {
                return Err(EngineError::InvalidReversal {
                    source_run_id,
                    employee_id: employee_id.to_string(),
                    message: format!("source run is {}, not locked", other.state()),
                });
            }
        };

        let slot = self.slot(run_id).await?;
        let mut run = slot.lock().await;
        let mut reversed = self.reversed.lock().await;
        let key = (source_run_id, employee_id.to_string());
        if reversed.contains(&key) {
            return Err(EngineError::InvalidReversal {
                source_run_id,
                employee_id: employee_id.to_string(),
                message: "line is already reversed".to_string(),
            });
        }
        match &mut *run {
            PayrollRun::Draft(draft) => draft.add_reversal(entry)?,
            other => return Err(other.invalid_transition("add a reversal to")),
        }
        reversed.insert(key);

        info!(
            run_id = %run_id,
            source_run_id = %source_run_id,
            employee_id = %employee_id,
            "Booked reversal entry"
        );
        Ok(run.clone())
    }

    /// Reflects a calculated run to accounting and locks it.
    ///
    /// Locking an already locked run exports nothing and returns
    /// [`LockOutcome::AlreadyLocked`].
    ///
    /// # Errors
    ///
    /// - [`EngineError::LockBlocked`] when failed lines or unacknowledged
    ///   warnings remain.
    /// - [`EngineError::ExportOutcomeUnknown`] when the ledger does not answer
    ///   within `export_timeout_ms`; the run stays `Calculated`, holds the
    ///   sent totals and accepts nothing but another lock until one confirms.
    pub async fn lock(&self, run_id: Uuid) -> EngineResult<LockOutcome> {
        let slot = self.slot(run_id).await?;
        let mut run = slot.lock().await;

        let mut calculated = match &*run {
            PayrollRun::Calculated(calculated) => calculated.clone(),
            PayrollRun::Locked(locked) => {
                warn!(run_id = %run_id, "Double lock attempt; run is already locked");
                return Ok(LockOutcome::AlreadyLocked(locked.clone()));
            }
            other => return Err(other.invalid_transition("lock")),
        };

        calculated.check_lockable()?;

        let export = calculated.export_to_send();
        let timeout = Duration::from_millis(self.config.settings().export_timeout_ms);
        let receipt = match tokio::time::timeout(timeout, self.exporter.export(&export)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    run_id = %run_id,
                    timeout_ms = self.config.settings().export_timeout_ms,
                    "Accounting export timed out; run frozen until a lock retry confirms it"
                );
                calculated.hold_export(export.clone());
                *run = PayrollRun::Calculated(calculated);
                return Err(EngineError::ExportOutcomeUnknown {
                    run_id,
                    message: format!(
                        "no confirmation within {} ms; retry the lock",
                        self.config.settings().export_timeout_ms
                    ),
                });
            }
        };

        let locked = calculated.into_locked(receipt, Utc::now());
        info!(
            run_id = %run_id,
            ledger_reference = %locked.receipt.ledger_reference,
            employee_count = locked.export.employee_count,
            total_net_pay = %locked.export.total_net_pay,
            "Locked payroll run"
        );

        *run = PayrollRun::Locked(locked.clone());
        Ok(LockOutcome::Locked(locked))
    }

    /// The computed line for one employee in a calculated or locked run.
    pub async fn line(&self, run_id: Uuid, employee_id: &str) -> EngineResult<LineOutcome> {
        let run = self.get_run(run_id).await?;
        let lines = run
            .lines()
            .ok_or_else(|| run.invalid_transition("read lines of"))?;
        lines
            .get(employee_id)
            .cloned()
            .ok_or_else(|| EngineError::LineNotFound {
                run_id,
                employee_id: employee_id.to_string(),
            })
    }

    async fn slot(&self, run_id: Uuid) -> EngineResult<RunSlot> {
        self.runs
            .read()
            .await
            .get(&run_id)
            .cloned()
            .ok_or(EngineError::RunNotFound { run_id })
    }
}

/// The failed line for an employee whose calculation task did not finish.
fn task_failure(run_id: Uuid, profile: &CompensationProfile, error: &JoinError) -> LineOutcome {
    let error = EngineError::CalculationError {
        message: if error.is_panic() {
            "calculation aborted unexpectedly".to_string()
        } else {
            "calculation was cancelled".to_string()
        },
    };
    warn!(
        run_id = %run_id,
        employee_id = %profile.employee_id,
        error = %error,
        "Payroll line failed"
    );
    LineOutcome::Failed(FailedLine::of(profile, &error))
}
