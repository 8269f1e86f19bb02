// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use watchparty_common::{Role, RoomId};

use crate::permissions::Action;
use crate::validation::ValidationError;

/// Failures raised by a storage tier adapter
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Record not found: {0}")]
    Missing(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Role {role} may not perform {action}")]
    Forbidden { role: Role, action: Action },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Room {room_id} diverged between storage tiers: {detail}")]
    Divergent { room_id: RoomId, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn room_not_found(room_id: &str) -> Self {
        AppError::NotFound(format!("room {room_id}"))
    }

    pub fn user_not_found(user_id: &str) -> Self {
        AppError::NotFound(format!("user {user_id}"))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Divergent { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NF_001",
            AppError::Forbidden { .. } => "AUTH_001",
            AppError::Validation(_) => "VAL_001",
            AppError::ExternalService(_) => "EXT_001",
            AppError::Storage(_) => "STORE_001",
            AppError::Divergent { .. } => "RECOVERY_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::Forbidden { .. } => {
                "You do not have permission to perform this action".to_string()
            },
            AppError::Validation(_) => "Invalid input provided".to_string(),
            AppError::ExternalService(_) => "Upstream service unavailable".to_string(),
            AppError::Storage(_) => "Storage temporarily unavailable".to_string(),
            AppError::Divergent { .. } => "Room synchronization required".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", self);
        }

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("task failed: {err}"))
    }
}
