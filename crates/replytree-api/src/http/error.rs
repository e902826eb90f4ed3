//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use replytree_types::error::BotError;

use crate::http::response::ApiResponse;

const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Bot-related errors.
    Bot(BotError),
    /// Generic internal error.
    Internal(String),
}

impl From<BotError> for AppError {
    fn from(e: BotError) -> Self {
        AppError::Bot(e)
    }
}

impl AppError {
    /// Status, code and user-facing messages for this error.
    fn parts(&self) -> (StatusCode, &'static str, Vec<String>) {
        match self {
            AppError::Bot(BotError::NotFound) => (
                StatusCode::NOT_FOUND,
                "BOT_NOT_FOUND",
                vec!["Bot not found".to_string()],
            ),
            AppError::Bot(BotError::Validation(messages)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", messages.clone())
            }
            AppError::Bot(e) => {
                tracing::error!(error = %e, "bot operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    vec![INTERNAL_MESSAGE.to_string()],
                )
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    vec![INTERNAL_MESSAGE.to_string()],
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, messages) = self.parts();
        let request_id = uuid::Uuid::now_v7().to_string();
        (status, Json(ApiResponse::errors(code, &messages, request_id))).into_response()
    }
}
