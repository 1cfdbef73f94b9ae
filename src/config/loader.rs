//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine settings
//! and statutory rate tables from YAML files.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::PayMonth;

use super::types::{EngineConfig, EngineSettings, RateTableSet, StatutoryRateTable};

/// Loads and provides access to engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory.
///
/// # Directory Structure
///
/// ```text
/// config/facility/
/// ├── engine.yaml         # Facility settings
/// └── rates/
///     ├── 2025-01.yaml    # Rate table effective from January 2025
///     └── 2026-01.yaml    # Rate table effective from January 2026
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/facility").unwrap();
/// println!("Loaded facility: {}", loader.settings().facility_name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A rate table fails validation or two tables share an effective month
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let tables = Self::load_rates(&path.join("rates"))?;
        let rate_tables = RateTableSet::new(tables)?;

        info!(
            facility_id = %settings.facility_id,
            rate_table_versions = rate_tables.versions().len(),
            "Loaded engine configuration"
        );

        Ok(Self {
            config: EngineConfig::new(settings, rate_tables),
        })
    }

    /// Loads and parses a YAML file.
    pub(crate) fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all rate tables from the rates directory.
    fn load_rates(rates_dir: &Path) -> EngineResult<Vec<StatutoryRateTable>> {
        let rates_dir_str = rates_dir.display().to_string();

        if !rates_dir.exists() {
            return Err(EngineError::ConfigNotFound {
                path: rates_dir_str,
            });
        }

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut tables = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let table = Self::load_yaml::<StatutoryRateTable>(&path)?;
                debug!(
                    path = %path.display(),
                    effective_month = %table.effective_month,
                    "Loaded rate table"
                );
                tables.push(table);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", rates_dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the facility settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }

    /// Returns the published rate tables.
    pub fn rate_tables(&self) -> &RateTableSet {
        self.config.rate_tables()
    }

    /// Gets the rate table effective for a month.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use payroll_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/facility")?;
    /// let table = loader.rate_table_for("2026-03".parse()?)?;
    /// println!("Pension rate: {}", table.insurance.pension.employee);
    /// # Ok::<(), payroll_engine::error::EngineError>(())
    /// ```
    pub fn rate_table_for(
        &self,
        month: PayMonth,
    ) -> EngineResult<std::sync::Arc<StatutoryRateTable>> {
        self.config.rate_tables().effective_for(month)
    }
}
