//! Error types for polling, notification, configuration, and the HTTP layer.
//!
//! [`PollError`] and [`NotifyError`] never leave the poller: they are logged
//! and the cycle is abandoned. [`ApiError`] maps to an HTTP status code and a
//! structured JSON error response.

use std::process::ExitStatus;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Failure of a single poll cycle. The cycle is abandoned and the history
/// store is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The configured endpoint does not form a valid URL.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),

    /// Transport failure, including the request timeout.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("unexpected response status: {0}")]
    Status(reqwest::StatusCode),

    /// The gzip body could not be inflated.
    #[error("failed to decompress response body: {0}")]
    Decompress(#[source] std::io::Error),

    /// The body is not a JSON array of items.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A departure time or window bound is not `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        /// The offending input.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },
}

/// Failure of the notification sink. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// No player command is configured.
    #[error("notification command is empty")]
    EmptyCommand,

    /// The player process could not be started or awaited.
    #[error("failed to run notification command: {0}")]
    Spawn(#[source] std::io::Error),

    /// The player process exited unsuccessfully.
    #[error("notification command exited with {0}")]
    ExitStatus(ExitStatus),

    /// The notification did not finish in time.
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value {value:?} for environment variable {key}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 3000,
///     "message": "internal error: ..."
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-facing error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The response body could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Internal(_) => 3000,
            Self::Encode(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Encode(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
