use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::proxy::upstream::UpstreamFailure;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// An upstream rejection for a non-cascaded operation. The caller gets
    /// the upstream status and body verbatim.
    #[error("Upstream failure (status {status})")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<UpstreamFailure> for AppError {
    fn from(failure: UpstreamFailure) -> Self {
        AppError::Upstream {
            status: failure.status,
            body: failure.body,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": {
                        "code": "VALIDATION_ERROR",
                        "message": msg
                    }
                })),
            )
                .into_response(),
            AppError::Upstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(body)).into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": {
                            "code": "INTERNAL_ERROR",
                            "message": "An internal server error occurred"
                        }
                    })),
                )
                    .into_response()
            }
        }
    }
}
