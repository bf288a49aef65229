use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::ai::AiError;

/// Errors surfaced at the HTTP boundary.
///
/// Entity lookups that miss become 404 with an empty body; malformed input
/// is 400; provider failures outside the detection path are 502; everything
/// else is an opaque 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Ai(e) => {
                tracing::error!(error = %e, "ai provider call failed");
                (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}
