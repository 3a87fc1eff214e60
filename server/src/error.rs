// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::EngineError;

use crate::store::StoreError;

/// Our custom error type for the application: a status code plus the
/// message the client sees. Internal detail stays in the logs.
pub struct AppError {
    pub code: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, &format!("{what} {id} not found"))
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let code = match err {
            EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
            EngineError::ScheduleConflict { .. }
            | EngineError::InvalidStatus { .. }
            | EngineError::AlreadyConverted { .. } => StatusCode::CONFLICT,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CorruptData { .. } | StoreError::Encode { .. } => Self {
                code: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
            },
            StoreError::Database(error) => {
                // Log the internal error for debugging.
                tracing::error!("Internal server error: {:?}", error);
                Self {
                    code: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "An internal error occurred.".to_string(),
                }
            }
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
