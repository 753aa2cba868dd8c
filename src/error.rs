//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::services::providers::ProviderError;

/// Errors that can abort a draft request or keep the service from starting.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Request body is not JSON: {0}")]
    BadBody(#[from] serde_json::Error),

    #[error("Counter store error: {0}")]
    Store(anyhow::Error),

    #[error("Upstream error: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DraftError {
    fn from(err: config::ConfigError) -> Self {
        DraftError::Config(anyhow::Error::new(err))
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for DraftError {
    fn into_response(self) -> Response {
        // Anything that escapes the pipeline collapses into a generic 400.
        // The cause stays in the logs; the body never carries detail and the
        // CORS set is not attached on this path.
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Bad request",
            }),
        )
            .into_response()
    }
}
