// ABOUTME: Application error type for API handlers
// ABOUTME: Maps storage, generation and transport failures to HTTP status codes and a structured body

use std::collections::HashMap;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqtrack_ai::{AIServiceError, GenerationError};
use reqtrack_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Main application error type that all handlers return
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("AI generation is not configured")]
    AiUnavailable,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Structured error response format for API consistency
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

/// Error detail structure with machine-readable codes
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<HashMap<String, String>>,
}

fn storage_status(err: &StorageError) -> (StatusCode, &'static str) {
    match err {
        StorageError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        StorageError::InvariantViolation(_) => (StatusCode::CONFLICT, "INVARIANT_VIOLATION"),
        StorageError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    }
}

fn storage_message(err: &StorageError) -> String {
    match err {
        StorageError::Validation(_)
        | StorageError::NotFound(_)
        | StorageError::InvariantViolation(_)
        | StorageError::InvalidTransition { .. } => err.to_string(),
        _ => "Data storage error".to_string(),
    }
}

fn storage_details(err: &StorageError) -> Option<HashMap<String, String>> {
    match err {
        StorageError::Validation(errors) => Some(
            errors
                .iter()
                .map(|e| (e.field.clone(), e.message.clone()))
                .collect(),
        ),
        StorageError::InvalidTransition { from, to } => Some(HashMap::from([
            ("from".to_string(), from.clone()),
            ("to".to_string(), to.clone()),
        ])),
        _ => None,
    }
}

impl AppError {
    /// Convert AppError to appropriate HTTP status code and error code
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::AiUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Storage(err) | AppError::Generation(GenerationError::Storage(err)) => {
                storage_status(err)
            }
            AppError::Generation(GenerationError::Ai(AIServiceError::NoApiKey)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE")
            }
            AppError::Generation(GenerationError::Ai(_)) => {
                (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR")
            }
        }
    }

    /// User-facing message, sanitized for internal failures
    fn to_user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation failed: {}", msg),
            AppError::AiUnavailable
            | AppError::Generation(GenerationError::Ai(AIServiceError::NoApiKey)) => {
                "AI generation is not configured; set ANTHROPIC_API_KEY".to_string()
            }
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Storage(err) | AppError::Generation(GenerationError::Storage(err)) => {
                storage_message(err)
            }
            AppError::Generation(GenerationError::Ai(AIServiceError::ApiError { .. })) => {
                "The AI provider returned an error".to_string()
            }
            AppError::Generation(GenerationError::Ai(_)) => {
                "The AI provider could not be reached or answered unexpectedly".to_string()
            }
        }
    }

    fn to_details(&self) -> Option<HashMap<String, String>> {
        match self {
            AppError::Storage(err) | AppError::Generation(GenerationError::Storage(err)) => {
                storage_details(err)
            }
            AppError::Generation(GenerationError::Ai(AIServiceError::ApiError {
                status, ..
            })) => Some(HashMap::from([(
                "upstream_status".to_string(),
                status.to_string(),
            )])),
            _ => None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();

        if status_code.is_server_error() {
            error!(
                request_id = %request_id,
                error_code = %error_code,
                error = ?self,
                "Request failed"
            );
        } else {
            info!(
                request_id = %request_id,
                error_code = %error_code,
                error = %self,
                "API error response"
            );
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: error_code.to_string(),
                message: self.to_user_message(),
                details: self.to_details(),
            },
            request_id,
        };

        (status_code, Json(body)).into_response()
    }
}
