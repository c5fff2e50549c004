//! Emotion classifier inference.
//!
//! The pipeline talks to the model through [`EmotionClassifier`], so the
//! ONNX-backed [`OnnxClassifier`] can be swapped for a fixed stand-in in
//! tests or when the `onnx` feature is off.

mod onnx;

pub use onnx::OnnxClassifier;

use std::path::PathBuf;
use thiserror::Error;

use crate::features::FeatureVector;

/// Errors that can occur while loading or running the classifier
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not found at path: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Feature not enabled: inference requires the 'onnx' feature")]
    FeatureNotEnabled,
}

/// A trained classifier mapping MFCC features to per-label probabilities.
///
/// Output order must match [`crate::emotion::Emotion::ALL`].
pub trait EmotionClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f32>, InferenceError>;

    /// Short description for logs and the health endpoint
    fn describe(&self) -> String {
        "emotion classifier".to_string()
    }
}

/// Configuration for loading the classifier
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,

    /// Number of threads for ONNX inference
    pub n_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.onnx"),
            n_threads: 1,
        }
    }
}

impl ModelConfig {
    /// Create a new config with the specified model path
    pub fn with_model_path(model_path: PathBuf) -> Self {
        Self {
            model_path,
            ..Default::default()
        }
    }
}
