//! Response types for the Payroll Engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response with the given body.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

/// The HTTP status an engine error is reported with.
fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::InvalidMonth { .. }
        | EngineError::InvalidProfile { .. }
        | EngineError::InvalidAttendance { .. } => StatusCode::BAD_REQUEST,
        EngineError::AttendanceNotFound { .. }
        | EngineError::ProfileNotFound { .. }
        | EngineError::RunNotFound { .. }
        | EngineError::LineNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::RunAlreadyExists { .. }
        | EngineError::InvalidTransition { .. }
        | EngineError::LockBlocked { .. }
        | EngineError::NothingToAcknowledge { .. }
        | EngineError::InvalidReversal { .. }
        | EngineError::ExportPending { .. }
        | EngineError::MissingRateTable { .. } => StatusCode::CONFLICT,
        EngineError::ExportOutcomeUnknown { .. } => StatusCode::GATEWAY_TIMEOUT,
        EngineError::ExportRejected { .. } => StatusCode::BAD_GATEWAY,
        EngineError::ConfigNotFound { .. }
        | EngineError::ConfigParseError { .. }
        | EngineError::InvalidRateTable { .. }
        | EngineError::CalculationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = status_for(&error);
        let body = match &error {
            EngineError::ExportOutcomeUnknown { .. } => ApiError::with_details(
                error.code(),
                error.to_string(),
                "The run stays calculated and frozen until a retried lock confirms the export",
            ),
            EngineError::MissingRateTable { .. } => ApiError::with_details(
                error.code(),
                error.to_string(),
                "Publish a rate table effective on or before the target month",
            ),
            _ => ApiError::new(error.code(), error.to_string()),
        };
        ApiErrorResponse {
            status,
            error: body,
        }
    }
}
