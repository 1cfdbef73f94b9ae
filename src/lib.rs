//! Payroll Engine for a residential care facility
//!
//! This crate computes monthly payroll from compensation profiles and
//! attendance facts, applies statutory insurance and tax withholding from
//! versioned rate tables, and drives each monthly run through
//! `Draft → Calculated → Locked`, reflecting locked runs to accounting.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod run;
pub mod store;
