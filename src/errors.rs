//! HTTP-facing error type and the mappings from service errors onto it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::models::DomainError;
use crate::services::file_service::FileError;
use crate::services::folder_service::FolderError;
use crate::services::user_service::AuthError;

/// A lightweight wrapper for request errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// Shortcut for 409 Conflict
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "request failed: {}", self.message);
        }

        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::EmptyName => AppError::bad_request(err.to_string()),
            DomainError::InvalidTransition { .. } => AppError::conflict(err.to_string()),
        }
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::Missing(_) => AppError::bad_request(err.to_string()),
            FileError::QuotaExceeded { .. } => AppError::conflict(err.to_string()),
            FileError::NotFound => AppError::not_found(err.to_string()),
            FileError::Domain(domain) => domain.into(),
            // Upstream/store failures surface as unexpected server errors;
            // the core does not retry or fall back.
            FileError::Blob(_) | FileError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<FolderError> for AppError {
    fn from(err: FolderError) -> Self {
        match err {
            FolderError::Missing(_) => AppError::bad_request(err.to_string()),
            FolderError::NotFound => AppError::not_found(err.to_string()),
            FolderError::ParentNotFound(_) => AppError::bad_request(err.to_string()),
            FolderError::NotEmpty(_) => AppError::conflict(err.to_string()),
            FolderError::Domain(domain) => domain.into(),
            FolderError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Missing(_) => AppError::bad_request(err.to_string()),
            AuthError::UsernameTaken | AuthError::EmailTaken => {
                AppError::conflict(err.to_string())
            }
            AuthError::InvalidCredentials => AppError::unauthorized(err.to_string()),
            AuthError::NotFound => AppError::not_found(err.to_string()),
            AuthError::Hash(_) | AuthError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}
