use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use resqnet_core::error::CoreError;
use resqnet_db::StoreError;
use resqnet_gemini::InferenceError;
use serde_json::json;

/// Message returned for every fault the service does not classify.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Message returned when a request overruns its deadline.
pub const TIMEOUT_MESSAGE: &str = "The request timed out";

/// Application-level error type for HTTP handlers.
///
/// Only the domain errors become caller-facing messages. Collaborator
/// failures are logged with their detail and answered with a generic 500.
/// Every error body has the shape `{"error": <message>}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `resqnet_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The incident store failed.
    #[error("Data store error: {0}")]
    Store(#[from] StoreError),

    /// The inference service failed.
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// The request could not be extracted (malformed JSON, wrong content type...).
    #[error("Rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The request overran its deadline.
    #[error("Request exceeded its {0:?} deadline")]
    Timeout(Duration),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, core.to_string()),
                CoreError::MissingParameter(_) => (StatusCode::BAD_REQUEST, core.to_string()),
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            },

            AppError::Store(err) => {
                tracing::error!(error = %err, "Data store call failed");
                internal()
            }
            AppError::Inference(err) => {
                tracing::error!(error = %err, "Inference call failed");
                internal()
            }

            AppError::Rejected { status, message } => (*status, message.clone()),
            AppError::Timeout(limit) => {
                tracing::error!(limit = ?limit, "Request deadline exceeded");
                (StatusCode::GATEWAY_TIMEOUT, TIMEOUT_MESSAGE.to_string())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_ERROR_MESSAGE.to_string(),
    )
}
