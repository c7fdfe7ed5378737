//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flowcron_core::CronError;
use thiserror::Error;
use tracing::error;

use crate::http::handlers::ApiResponse;

/// Message returned for unknown jobs. Existing clients match on it.
pub const NOT_FOUND_MESSAGE: &str = "Could not find the job";

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    /// The scheduler rejected or failed the operation.
    #[error(transparent)]
    Cron(#[from] CronError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Cron(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Cron(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Cron(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Cron(e) if e.is_not_found() => NOT_FOUND_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(ApiResponse::failure(self.message()))).into_response()
    }
}
