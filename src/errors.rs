// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! HTTP error type and the `{statusCode, error, message}` envelope every
//! failed request is rendered with.

use crate::services::elasticsearch::EsError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Failure reported by a remote system, surfaced with its own status code.
    #[error("{message}")]
    Remote { status: StatusCode, message: String },

    #[error("{0}")]
    Internal(String),
}

/// JSON body of an error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Remote { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let status = self.status();
        // Internal details stay in the logs
        let message = if status.is_server_error() && !matches!(self, ApiError::Remote { .. }) {
            "An internal server error occurred".to_string()
        } else {
            self.to_string()
        };
        ErrorEnvelope {
            status_code: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message,
        }
    }
}

/// Wrap an error coming back from Elasticsearch so the caller sees the
/// cluster's own status code and reason.
pub fn wrap_error(err: EsError) -> ApiError {
    match err {
        EsError::Status { status, reason, .. } => ApiError::Remote {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: reason,
        },
        EsError::Transport(e) => ApiError::Remote {
            status: StatusCode::BAD_GATEWAY,
            message: format!("Unable to reach Elasticsearch: {e}"),
        },
        other => ApiError::Internal(other.to_string()),
    }
}

impl From<EsError> for ApiError {
    fn from(err: EsError) -> Self {
        wrap_error(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request payload JSON format: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        if envelope.status_code >= 500 {
            tracing::error!(status = envelope.status_code, error = %self, "request failed");
        } else {
            tracing::debug!(status = envelope.status_code, error = %self, "request rejected");
        }
        let status = self.status();
        (status, Json(envelope)).into_response()
    }
}
