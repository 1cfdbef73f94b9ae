//! In-memory adapters for the store ports.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AccountingExporter, AttendanceProvider, ProfileStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceFacts, CompensationProfile, PayMonth};
use crate::run::{AccountingExport, ExportReceipt};

/// A thread-safe in-memory profile store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<BTreeMap<String, CompensationProfile>>>,
}

impl InMemoryProfileStore {
    /// Creates a new, empty profile store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn list_profiles(&self) -> EngineResult<Vec<CompensationProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.values().cloned().collect())
    }

    async fn get_profile(&self, employee_id: &str) -> EngineResult<Option<CompensationProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(employee_id).cloned())
    }

    async fn upsert_profile(&self, profile: CompensationProfile) -> EngineResult<()> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.employee_id.clone(), profile);
        Ok(())
    }
}

/// A thread-safe in-memory attendance store keyed by employee and month.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAttendanceStore {
    facts: Arc<RwLock<HashMap<(String, PayMonth), AttendanceFacts>>>,
}

impl InMemoryAttendanceStore {
    /// Creates a new, empty attendance store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttendanceProvider for InMemoryAttendanceStore {
    async fn get_attendance(
        &self,
        employee_id: &str,
        month: PayMonth,
    ) -> EngineResult<Option<AttendanceFacts>> {
        let facts = self.facts.read().await;
        Ok(facts.get(&(employee_id.to_string(), month)).cloned())
    }

    async fn upsert_attendance(&self, facts: AttendanceFacts) -> EngineResult<()> {
        let mut store = self.facts.write().await;
        store.insert((facts.employee_id.clone(), facts.month), facts);
        Ok(())
    }
}

#[derive(Debug)]
struct Posting {
    export: AccountingExport,
    receipt: ExportReceipt,
}

/// An in-memory accounting ledger that posts each run at most once.
///
/// An optional latency is applied after the posting is recorded, which lets
/// callers observe a posting whose confirmation arrived too late. A repost
/// of a run with different totals is rejected.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    postings: Arc<RwLock<HashMap<Uuid, Posting>>>,
    latency: Arc<RwLock<Option<Duration>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty ledger that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger that waits `latency` before confirming each export.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            postings: Arc::default(),
            latency: Arc::new(RwLock::new(Some(latency))),
        }
    }

    /// Changes the confirmation latency for every clone of this ledger.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// Number of distinct runs posted.
    pub async fn posting_count(&self) -> usize {
        self.postings.read().await.len()
    }

    /// The totals posted for a run, if any.
    pub async fn posted(&self, run_id: Uuid) -> Option<AccountingExport> {
        let postings = self.postings.read().await;
        postings.get(&run_id).map(|p| p.export.clone())
    }
}

#[async_trait]
impl AccountingExporter for InMemoryLedger {
    async fn export(&self, export: &AccountingExport) -> EngineResult<ExportReceipt> {
        let receipt = {
            let mut postings = self.postings.write().await;
            if let Some(existing) = postings.get(&export.run_id) {
                if existing.export != *export {
                    warn!(
                        run_id = %export.run_id,
                        ledger_reference = %existing.receipt.ledger_reference,
                        "Repost with different totals rejected"
                    );
                    return Err(EngineError::ExportRejected {
                        run_id: export.run_id,
                        message: format!(
                            "already posted as {} with different totals",
                            existing.receipt.ledger_reference
                        ),
                    });
                }
                info!(run_id = %export.run_id, "Run already posted; returning original receipt");
                existing.receipt.clone()
            } else {
                let receipt = ExportReceipt {
                    run_id: export.run_id,
                    ledger_reference: format!("LEDGER-{:06}", postings.len() + 1),
                    recorded_at: Utc::now(),
                };
                postings.insert(
                    export.run_id,
                    Posting {
                        export: export.clone(),
                        receipt: receipt.clone(),
                    },
                );
                info!(
                    run_id = %export.run_id,
                    ledger_reference = %receipt.ledger_reference,
                    total_net_pay = %export.total_net_pay,
                    "Posted payroll run to ledger"
                );
                receipt
            }
        };

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        Ok(receipt)
    }
}
