//! Application error type mapping to HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use omaha_types::error::ComposeError;
use omaha_types::llm::LlmError;

/// Message for a missing or blank question.
pub const QUESTION_REQUIRED: &str = "Question is required";

/// Application-level error that maps to HTTP responses.
///
/// Every variant is produced before the response stream opens; once
/// streaming has started, failures travel as `error` events instead.
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400).
    Validation(String),
    /// Wrong method on a known path (405).
    MethodNotAllowed,
    /// Generic internal error (500). The message is client-safe.
    Internal(String),
}

impl From<ComposeError> for AppError {
    fn from(e: ComposeError) -> Self {
        match e {
            ComposeError::EmptyQuestion => AppError::Validation(QUESTION_REQUIRED.to_string()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Internal(e.short_description().to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error", "message": msg }),
            ),
        };

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
