//! REST API module for HTTP endpoints
//!
//! Provides the CRUD surface of the mutation gateway:
//! - `GET /todos` - Full list snapshot (revision in `x-snapshot-revision`)
//! - `POST /todos` - Create an item
//! - `PUT /todos/:id` - Set an item's completion flag
//! - `DELETE /todos/:id` - Remove an item

pub mod todos;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::types::TodoError;

/// Header carrying the revision a `GET /todos` snapshot corresponds to
pub const REVISION_HEADER: &str = "x-snapshot-revision";

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "NOT_FOUND".to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "VALIDATION_FAILED".to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "STORE_UNAVAILABLE".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INTERNAL_ERROR".to_string(),
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            TodoError::NotFound(_) => (StatusCode::NOT_FOUND, ApiError::not_found(message)),
            TodoError::ValidationFailed(_) => {
                (StatusCode::BAD_REQUEST, ApiError::validation(message))
            }
            TodoError::StoreUnavailable(_) => {
                error!(error = %message, "store failure");
                (StatusCode::SERVICE_UNAVAILABLE, ApiError::unavailable(message))
            }
            _ => {
                error!(error = %message, "unexpected error");
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal(message))
            }
        };
        (status, Json(body)).into_response()
    }
}
