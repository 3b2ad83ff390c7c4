use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Per-document conditions (`UnsupportedFormat`) exclude a single candidate;
/// batch-level conditions (`EmptyReference`, `NoValidCandidates`,
/// `ComputationTimeout`) abort a whole scoring run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Cleaned job description is empty")]
    EmptyReference,

    #[error("No valid resumes found after processing")]
    NoValidCandidates,

    #[error("Similarity computation exceeded {0} seconds")]
    ComputationTimeout(u64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UnsupportedFormat(ext) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                format!("Unsupported file format: {ext}"),
            ),
            AppError::EmptyReference => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_REFERENCE",
                "Job description is empty after cleaning".to_string(),
            ),
            AppError::NoValidCandidates => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_VALID_CANDIDATES",
                "No resumes survived extraction and cleaning".to_string(),
            ),
            AppError::ComputationTimeout(secs) => {
                tracing::error!("Similarity computation timed out after {secs}s");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPUTATION_TIMEOUT",
                    "Similarity computation timed out".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
