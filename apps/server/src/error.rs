// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.
//!
//! Structural errors abort the whole request here. Per-file and per-field
//! errors never reach this type: they are recorded in the aggregate
//! response and reported through its failure path instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Request-level errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("FAIL! Files limit reached: maximum {max} files per request")]
    FilesLimitReached { max: usize },

    #[error("FAIL! Parts limit reached: maximum {max} parts per request")]
    PartsLimitReached { max: usize },

    #[error("FAIL! Fields limit reached: maximum {max} fields per request")]
    FieldsLimitReached { max: usize },

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::FilesLimitReached { .. } => "FILES_LIMIT_REACHED",
            ApiError::PartsLimitReached { .. } => "PARTS_LIMIT_REACHED",
            ApiError::FieldsLimitReached { .. } => "FIELDS_LIMIT_REACHED",
            ApiError::Multipart(_) => "MULTIPART_ERROR",
            ApiError::Join(_) => "TASK_ERROR",
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
