//! Request-level error taxonomy.
//!
//! Each component has its own error enum; this one collects them so the
//! transport layer can map failures to distinct status codes.

use thiserror::Error;

use crate::audio::DecodeError;
use crate::features::FeatureError;
use crate::model::InferenceError;

/// Errors that can occur while analyzing one request
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("Failed to decode audio: {0}")]
    Decode(#[from] DecodeError),

    #[error("Feature extraction failed: {0}")]
    Features(#[from] FeatureError),

    #[error("Model output has {actual} values, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Short machine-readable tag for responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "missing_input",
            Self::Decode(_) => "decode",
            Self::Features(_) => "features",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::Inference(_) => "inference",
            Self::Internal(_) => "internal",
        }
    }

    /// True when the caller sent something we cannot process
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_) | Self::Decode(_) | Self::Features(_)
        )
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        AnalysisError::Internal(e.to_string())
    }
}
