// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the HTTP surface.
//!
//! Every failure is rendered as `{"error": <message>}` with the status implied by the
//! variant. Store messages pass through verbatim.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Required input was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The access-control gate rejected the request.
    #[error("Unauthorized - missing API key")]
    Unauthorized,

    /// The record store failed or is not configured.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for route handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
