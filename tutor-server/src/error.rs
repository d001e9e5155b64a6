//! Server error types

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tutor_core::EngineError;

/// Errors that can occur in the tutor server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map an engine error to its HTTP status and body
pub fn error_response(err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Forbidden { .. } => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let code = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "INTERNAL_ERROR"
    } else {
        err.code()
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}
