use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{db::DbError, openapi::ErrorResponse, services::PromptServiceError};

/// Errors returned by the prompt API.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(String),
    Database(DbError),
}

impl From<PromptServiceError> for ApiError {
    fn from(err: PromptServiceError) -> Self {
        match err {
            PromptServiceError::NotFound => ApiError::NotFound("Prompt not found".to_string()),
            PromptServiceError::Validation(msg) => ApiError::Validation(msg),
            PromptServiceError::Storage(DbError::Validation(msg)) => ApiError::Validation(msg),
            PromptServiceError::Storage(err) => ApiError::Database(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
            }
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "An internal database error occurred".to_string(),
                )
            }
        };

        let body = if status.is_server_error() {
            ErrorResponse::with_type("internal_error", code, message)
        } else {
            ErrorResponse::new(code, message)
        };

        (status, Json(body)).into_response()
    }
}
