//! Error types for the Payroll Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while calculating payroll and
//! moving a payroll run through its lifecycle.

use thiserror::Error;
use uuid::Uuid;

use crate::models::PayMonth;
use crate::run::RunState;

/// The main error type for the Payroll Engine.
///
/// Errors fall into two groups. Per-employee errors (`InvalidAttendance`,
/// `InvalidProfile`, `AttendanceNotFound`, and a `CalculationError` raised
/// while pricing one employee) are recorded on that employee's line and
/// never abort a run. Every other variant aborts the operation that
/// raised it.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::MissingRateTable {
///     month: "2026-03".parse().unwrap(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "No statutory rate table is effective for 2026-03"
/// );
/// assert_eq!(error.code(), "MISSING_RATE_TABLE");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A statutory rate table is internally inconsistent.
    #[error("Invalid rate table effective {effective_month}: {message}")]
    InvalidRateTable {
        /// The month the table takes effect.
        effective_month: PayMonth,
        /// What is wrong with the table.
        message: String,
    },

    /// A month string was not in `YYYY-MM` form.
    #[error("Invalid month '{value}': expected YYYY-MM")]
    InvalidMonth {
        /// The rejected input.
        value: String,
    },

    /// A compensation profile field is unusable for calculation.
    #[error("Invalid profile for employee '{employee_id}', field '{field}': {message}")]
    InvalidProfile {
        /// The employee whose profile is invalid.
        employee_id: String,
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// Attendance data from upstream is malformed (e.g. negative hours).
    #[error("Invalid attendance for employee '{employee_id}', field '{field}': {message}")]
    InvalidAttendance {
        /// The employee whose attendance is invalid.
        employee_id: String,
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// No attendance record exists for an active employee.
    #[error("No attendance facts for employee '{employee_id}' in {month}")]
    AttendanceNotFound {
        /// The employee with no attendance.
        employee_id: String,
        /// The month that was requested.
        month: PayMonth,
    },

    /// No statutory rate table covers the month.
    #[error("No statutory rate table is effective for {month}")]
    MissingRateTable {
        /// The month with no effective table.
        month: PayMonth,
    },

    /// No compensation profile exists for the employee.
    #[error("Compensation profile not found: {employee_id}")]
    ProfileNotFound {
        /// The employee that was requested.
        employee_id: String,
    },

    /// No payroll run exists with the given id.
    #[error("Payroll run not found: {run_id}")]
    RunNotFound {
        /// The run that was requested.
        run_id: Uuid,
    },

    /// A run already exists for the facility and month.
    #[error("Payroll run {existing_run_id} already exists for facility '{facility_id}' in {month}")]
    RunAlreadyExists {
        /// The facility.
        facility_id: String,
        /// The target month.
        month: PayMonth,
        /// The run that already covers the month.
        existing_run_id: Uuid,
    },

    /// The requested transition is not allowed from the run's current state.
    #[error("Cannot {action} payroll run {run_id} while it is {state}")]
    InvalidTransition {
        /// The run.
        run_id: Uuid,
        /// The run's current state.
        state: RunState,
        /// The attempted action.
        action: String,
    },

    /// Lock preconditions are not met.
    #[error(
        "Payroll run {run_id} cannot be locked: {failed_lines} failed line(s), \
         {unacknowledged_warnings} unacknowledged negative net pay warning(s)"
    )]
    LockBlocked {
        /// The run.
        run_id: Uuid,
        /// Number of lines in the `Failed` state.
        failed_lines: usize,
        /// Number of negative net pay warnings awaiting acknowledgement.
        unacknowledged_warnings: usize,
    },

    /// The run has no line for the employee.
    #[error("Payroll run {run_id} has no line for employee '{employee_id}'")]
    LineNotFound {
        /// The run.
        run_id: Uuid,
        /// The employee that was requested.
        employee_id: String,
    },

    /// The line has no warning waiting for acknowledgement.
    #[error("Employee '{employee_id}' has no unacknowledged warning in payroll run {run_id}")]
    NothingToAcknowledge {
        /// The run.
        run_id: Uuid,
        /// The employee.
        employee_id: String,
    },

    /// A reversal entry cannot be booked.
    #[error("Invalid reversal of run {source_run_id} for employee '{employee_id}': {message}")]
    InvalidReversal {
        /// The locked run being corrected.
        source_run_id: Uuid,
        /// The employee whose line is reversed.
        employee_id: String,
        /// Why the reversal was rejected.
        message: String,
    },

    /// The accounting export did not answer in time; the run stays unlocked.
    #[error("Accounting export outcome unknown for payroll run {run_id}: {message}")]
    ExportOutcomeUnknown {
        /// The run being exported.
        run_id: Uuid,
        /// What happened.
        message: String,
    },

    /// An export with an unknown outcome is outstanding; only retrying the
    /// lock can settle it.
    #[error("Cannot {action} payroll run {run_id}: an accounting export awaits confirmation; retry the lock")]
    ExportPending {
        /// The run holding the unconfirmed export.
        run_id: Uuid,
        /// The rejected action.
        action: String,
    },

    /// The accounting collaborator rejected the export.
    #[error("Accounting export rejected for payroll run {run_id}: {message}")]
    ExportRejected {
        /// The run being exported.
        run_id: Uuid,
        /// The collaborator's reason.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// A stable machine-readable code for the error.
    ///
    /// Used for failed payroll lines and API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
            EngineError::InvalidRateTable { .. } => "INVALID_RATE_TABLE",
            EngineError::InvalidMonth { .. } => "INVALID_MONTH",
            EngineError::InvalidProfile { .. } => "INVALID_PROFILE",
            EngineError::InvalidAttendance { .. } => "INVALID_ATTENDANCE",
            EngineError::AttendanceNotFound { .. } => "ATTENDANCE_NOT_FOUND",
            EngineError::MissingRateTable { .. } => "MISSING_RATE_TABLE",
            EngineError::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            EngineError::RunNotFound { .. } => "RUN_NOT_FOUND",
            EngineError::RunAlreadyExists { .. } => "RUN_ALREADY_EXISTS",
            EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EngineError::LockBlocked { .. } => "LOCK_BLOCKED",
            EngineError::LineNotFound { .. } => "LINE_NOT_FOUND",
            EngineError::NothingToAcknowledge { .. } => "NOTHING_TO_ACKNOWLEDGE",
            EngineError::InvalidReversal { .. } => "INVALID_REVERSAL",
            EngineError::ExportOutcomeUnknown { .. } => "EXPORT_OUTCOME_UNKNOWN",
            EngineError::ExportPending { .. } => "EXPORT_PENDING",
            EngineError::ExportRejected { .. } => "EXPORT_REJECTED",
            EngineError::CalculationError { .. } => "CALCULATION_ERROR",
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
