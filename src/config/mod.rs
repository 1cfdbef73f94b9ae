//! Configuration loading and management for the Payroll Engine.
//!
//! This module provides functionality to load facility settings and the
//! versioned statutory rate tables from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/facility").unwrap();
//! println!("Loaded facility: {}", config.settings().facility_name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    EngineConfig, EngineSettings, InsuranceRate, InsuranceRates, RateTableSet,
    StatutoryRateTable, TaxBracket, WagePolicy,
};

#[cfg(test)]
pub(crate) use types::fixtures;
