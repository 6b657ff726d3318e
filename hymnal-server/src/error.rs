//! Error types for hymnal-server
//!
//! Every handler error renders as JSON `{"error": message}`; proxy failures
//! additionally carry a `details` string.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::drive::DriveError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Conflict with existing state (409)
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// Upstream failure while proxying Drive content (500)
    #[error("Failed to proxy file: {0}")]
    Proxy(String),

    /// Drive / OAuth failure outside the proxy route
    #[error(transparent)]
    Drive(#[from] DriveError),

    /// hymnal-common error
    #[error(transparent)]
    Common(#[from] hymnal_common::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(hymnal_common::Error::Database(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Proxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Drive(err) => match err {
                DriveError::NotFound(_) => StatusCode::NOT_FOUND,
                DriveError::MissingRefreshToken => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Common(err) => match err {
                hymnal_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                hymnal_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                hymnal_common::Error::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = match self {
            ApiError::Proxy(details) => json!({
                "error": "Failed to proxy file",
                "details": details,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
