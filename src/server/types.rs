//! Wire types for the HTTP and socket interfaces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::emotion::AnalysisOutcome;
use crate::error::AnalysisError;

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Errors returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    Analysis(AnalysisError),
    /// The request body grew past the configured upload limit
    PayloadTooLarge(String),
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        ApiError::Analysis(e)
    }
}

/// HTTP status for an analysis failure
pub fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::MissingInput(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Decode(_) | AnalysisError::Features(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::ShapeMismatch { .. }
        | AnalysisError::Inference(_)
        | AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Analysis(err) => {
                let status = status_for(&err);
                if err.is_client_error() {
                    tracing::warn!("Rejected request ({}): {}", err.kind(), err);
                } else {
                    tracing::error!("Analysis failed ({}): {}", err.kind(), err);
                }

                // Missing-field responses keep the bare `{error}` shape
                let kind = match err {
                    AnalysisError::MissingInput(_) => None,
                    _ => Some(err.kind().to_string()),
                };
                let body = ErrorBody {
                    error: err.to_string(),
                    kind,
                };
                (status, Json(body)).into_response()
            }
            ApiError::PayloadTooLarge(message) => {
                tracing::warn!("Upload rejected: {}", message);
                let body = ErrorBody {
                    error: message,
                    kind: Some("payload_too_large".to_string()),
                };
                (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response()
            }
        }
    }
}

/// Events a socket client may send as text frames.
///
/// Binary frames are always treated as `audio_data`.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    AudioData(Vec<f32>),
}

/// Events emitted back to the socket client
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    EmotionResult(AnalysisOutcome),
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

impl From<Result<AnalysisOutcome, AnalysisError>> for ServerEvent {
    fn from(result: Result<AnalysisOutcome, AnalysisError>) -> Self {
        match result {
            Ok(outcome) => ServerEvent::EmotionResult(outcome),
            Err(e) => ServerEvent::error(e.to_string()),
        }
    }
}
