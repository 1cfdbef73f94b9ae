//! Request bodies for the Payroll Engine API.
//!
//! Profiles and attendance facts are accepted as their domain types; the
//! types here cover the run lifecycle endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PayMonth;

/// Body of `POST /runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// The month to pay, `YYYY-MM`.
    pub target_month: PayMonth,
}

/// Body of `POST /runs/:run_id/acknowledgements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    /// The employee whose negative net pay is acknowledged.
    pub employee_id: String,
    /// The administrator acknowledging it.
    pub acknowledged_by: String,
}

/// Body of `POST /runs/:run_id/reversals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalRequest {
    /// The locked run whose line is reversed.
    pub source_run_id: Uuid,
    /// The employee whose line is reversed.
    pub employee_id: String,
}
