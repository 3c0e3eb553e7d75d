//! Error types for the HTTP layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use recollect_rs_core::CoreError;
use serde::Serialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Failures starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// JSON error body returned by API routes.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownSession(_) => {
                Self::new(StatusCode::NOT_FOUND, "unknown_session", err.to_string())
            }
            CoreError::Unauthorized => {
                Self::new(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
            }
            other => {
                error!("request failed (error={})", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    other.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
