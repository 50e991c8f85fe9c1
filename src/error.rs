//! Application error types and their mapping to transport-specific responses.
//!
//! `AppError` is the single typed error enum shared by the cascade, the
//! request handler, and both transport adapters. The core never encodes a
//! transport concern (HTTP status, JSON-RPC error code) into the variant
//! itself — `IntoResponse` below is the HTTP mapping; the stdio adapter maps
//! the same enum to JSON-RPC error codes independently.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("domain not configured: {0}")]
    NotConfigured(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("no content: {0}")]
    NoContent(String),

    #[error("upstream timeout")]
    UpstreamTimeout,

    #[error("upstream HTTP error: {0}")]
    UpstreamHttpError(u16),

    #[error("upstream TLS error: {0}")]
    UpstreamTlsError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// JSON-RPC 2.0 error code, per the stdio transport's wire contract.
    pub fn rpc_code(&self) -> i64 {
        match self {
            AppError::InvalidArgument(_) => -32602,
            AppError::NotConfigured(_) => -32601,
            AppError::RateLimited { .. } => -32000,
            AppError::NoContent(_) => -32001,
            AppError::UpstreamTimeout
            | AppError::UpstreamHttpError(_)
            | AppError::UpstreamTlsError(_)
            | AppError::ParseError(_) => -32002,
            AppError::Config(_) | AppError::Internal(_) => -32603,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::NotConfigured(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NoContent(_) => StatusCode::OK,
            AppError::UpstreamTimeout
            | AppError::UpstreamHttpError(_)
            | AppError::UpstreamTlsError(_)
            | AppError::ParseError(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = json!({
            "articles": [],
            "error": self.to_string(),
        });

        if let AppError::RateLimited { retry_after_secs } = &self {
            body["retryAfter"] = json!(retry_after_secs);
        }

        (status, Json(body)).into_response()
    }
}
