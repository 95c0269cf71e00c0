use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::storage_service::StorageError;

/// Which JSON body an error renders as. The upload endpoint reports
/// `{"success": false, "message": ...}`, the listing endpoint `{"error": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorShape {
    Upload,
    Listing,
}

/// A lightweight wrapper for request errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub shape: ErrorShape,
}

impl AppError {
    /// Malformed or empty request. Surfaced as 400, never retried.
    pub fn client(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
            shape: ErrorShape::Upload,
        }
    }

    /// Backend failure on the upload path. Surfaced as 500 with the raw
    /// error text; transient and permanent failures are not distinguished.
    pub fn storage(err: StorageError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            shape: ErrorShape::Upload,
        }
    }

    /// Backend failure on the listing path.
    pub fn listing(err: StorageError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            shape: ErrorShape::Listing,
        }
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
        let body = match self.shape {
            ErrorShape::Upload => Json(json!({
                "success": false,
                "message": self.message,
            })),
            ErrorShape::Listing => Json(json!({
                "error": self.message,
            })),
        };

        (self.status, body).into_response()
    }
}
