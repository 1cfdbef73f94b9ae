//! Application state for the Payroll Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::run::PayrollOrchestrator;

/// Shared application state.
///
/// Wraps the orchestrator that owns every payroll run and the stores it
/// reads from.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<PayrollOrchestrator>,
}

impl AppState {
    /// Creates a new application state around an orchestrator.
    pub fn new(orchestrator: PayrollOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Returns the orchestrator.
    pub fn orchestrator(&self) -> &PayrollOrchestrator {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone_and_send() {
        fn assert_state<T: Clone + Send + Sync + 'static>() {}
        assert_state::<AppState>();
    }
}
