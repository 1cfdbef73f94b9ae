//! Boundaries to the engine's external collaborators.
//!
//! Compensation profiles and attendance facts are owned by other parts of
//! the back office; the accounting ledger receives run totals. Each is an
//! async port with an in-memory adapter.

mod in_memory;
mod seed;

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::models::{AttendanceFacts, CompensationProfile, PayMonth};
use crate::run::{AccountingExport, ExportReceipt};

pub use in_memory::{InMemoryAttendanceStore, InMemoryLedger, InMemoryProfileStore};
pub use seed::SeedData;

/// Source of compensation profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Every profile, active or not, ordered by employee id.
    async fn list_profiles(&self) -> EngineResult<Vec<CompensationProfile>>;
    /// One employee's profile.
    async fn get_profile(&self, employee_id: &str) -> EngineResult<Option<CompensationProfile>>;
    /// Creates or replaces a profile.
    async fn upsert_profile(&self, profile: CompensationProfile) -> EngineResult<()>;
}

/// Source of monthly attendance facts.
#[async_trait]
pub trait AttendanceProvider: Send + Sync {
    /// One employee's attendance for a month.
    async fn get_attendance(
        &self,
        employee_id: &str,
        month: PayMonth,
    ) -> EngineResult<Option<AttendanceFacts>>;
    /// Creates or replaces an attendance record.
    async fn upsert_attendance(&self, facts: AttendanceFacts) -> EngineResult<()>;
}

/// The accounting ledger that locked runs are reflected to.
///
/// Implementations must be idempotent by `run_id`: exporting the same run
/// again returns the original receipt without posting twice.
#[async_trait]
pub trait AccountingExporter: Send + Sync {
    /// Posts a run's totals.
    async fn export(&self, export: &AccountingExport) -> EngineResult<ExportReceipt>;
}
