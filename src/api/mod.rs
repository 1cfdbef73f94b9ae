//! HTTP API module for the Payroll Engine.
//!
//! This module exposes compensation profiles, attendance facts and the
//! payroll run lifecycle as JSON endpoints, plus the CSV monthly extract.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AcknowledgeRequest, CreateRunRequest, ReversalRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
