//! Seed data for the in-memory stores.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AttendanceProvider, ProfileStore};
use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::models::{AttendanceFacts, CompensationProfile};

/// Profiles and attendance loaded from a YAML file at startup.
///
/// # Example
///
/// ```yaml
/// profiles:
///   - employee_id: emp_001
///     name: Kim Minji
///     employment_type: hourly
///     base_wage: "12000"
///     hire_date: 2020-03-01
/// attendance:
///   - employee_id: emp_001
///     month: "2026-01"
///     work_days: 20
///     regular_hours: "160"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    /// Compensation profiles.
    #[serde(default)]
    pub profiles: Vec<CompensationProfile>,
    /// Attendance facts.
    #[serde(default)]
    pub attendance: Vec<AttendanceFacts>,
}

impl SeedData {
    /// Reads seed data from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        ConfigLoader::load_yaml(path.as_ref())
    }

    /// Writes every record into the given stores.
    pub async fn apply(
        self,
        profiles: &dyn ProfileStore,
        attendance: &dyn AttendanceProvider,
    ) -> EngineResult<()> {
        let profile_count = self.profiles.len();
        let attendance_count = self.attendance.len();

        for profile in self.profiles {
            profiles.upsert_profile(profile).await?;
        }
        for facts in self.attendance {
            attendance.upsert_attendance(facts).await?;
        }

        info!(profile_count, attendance_count, "Seeded in-memory stores");
        Ok(())
    }
}
