//! HTTP-facing errors.
//!
//! Every failure, whether rejected at the boundary or raised by `hashgen`,
//! renders the same `{"status":"failed"}` body; only the status code differs.
//!
//! ## Error Cases
//! - `InvalidCount`: The `{count}` path segment is not a non-negative integer.
//! - `CountTooLarge`: The count exceeds `MAX_ALLOWED_HASHES`.
//! - `Core`: Digest generation failed or was cancelled.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::server::telemetry::increment_request_errors;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid count: {raw:?}")]
    InvalidCount { raw: String },

    #[error("Count {requested} exceeds maximum allowed ({max})")]
    CountTooLarge { requested: usize, max: usize },

    #[error(transparent)]
    Core(#[from] hashgen::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCount { .. } | Self::CountTooLarge { .. } => StatusCode::BAD_REQUEST,
            Self::Core(hashgen::Error::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The envelope returned for every failed request.
#[derive(Debug, Serialize)]
pub struct FailedBody {
    pub status: &'static str,
}

impl FailedBody {
    pub const fn new() -> Self {
        Self { status: "failed" }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        increment_request_errors();

        let status = self.status();
        #[cfg(feature = "tracing")]
        {
            if status.is_server_error() {
                tracing::error!("Request failed: {self}");
            } else {
                tracing::debug!("Request rejected: {self}");
            }
        }

        (status, Json(FailedBody::new())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let invalid = ApiError::InvalidCount {
            raw: "abc".to_string(),
        };
        let too_large = ApiError::CountTooLarge {
            requested: 11,
            max: 10,
        };
        let cancelled = ApiError::from(hashgen::Error::Cancelled);
        let failed = ApiError::from(hashgen::Error::EntropyUnavailable {
            reason: "none".to_string(),
        });

        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(too_large.status(), StatusCode::BAD_REQUEST);
        assert_eq!(cancelled.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
