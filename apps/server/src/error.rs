//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use quotecache_core::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error shape returned to HTTP clients: a status code and
/// `{"error": "..."}`, matching what the CLI prints.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Upstream(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::SymbolNotFound(_) | Error::UnknownProvider(_) => {
                ApiError::BadRequest(error.to_string())
            }
            Error::ProviderNotConfigured(_) | Error::MarketData(_) => {
                ApiError::Upstream(error.to_string())
            }
            Error::Database(_) | Error::Unexpected(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(message) => {
                tracing::error!("internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
