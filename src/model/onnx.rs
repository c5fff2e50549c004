//! ONNX Runtime backed classifier.
//!
//! The exported network takes a `[batch, 13, 1]` float tensor of mean MFCCs
//! and returns softmax probabilities, one per emotion label.

#[cfg(feature = "onnx")]
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
#[cfg(feature = "onnx")]
use std::sync::Mutex;

#[cfg(feature = "onnx")]
use crate::features::N_MFCC;

use super::{EmotionClassifier, InferenceError, ModelConfig};
use crate::features::FeatureVector;

/// Emotion classifier running an ONNX model.
///
/// `Session::run` needs exclusive access, so concurrent requests serialize
/// on the session lock for the duration of one forward pass.
#[cfg(feature = "onnx")]
pub struct OnnxClassifier {
    session: Mutex<Session>,
    config: ModelConfig,
}

#[cfg(feature = "onnx")]
impl OnnxClassifier {
    /// Load the model. Called once at startup.
    pub fn load(config: &ModelConfig) -> Result<Self, InferenceError> {
        if !config.model_path.exists() {
            return Err(InferenceError::ModelNotFound(config.model_path.clone()));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| InferenceError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| InferenceError::ModelLoad(e.to_string()))?
            .with_intra_threads(config.n_threads)
            .map_err(|e: ort::Error| InferenceError::ModelLoad(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e: ort::Error| InferenceError::ModelLoad(e.to_string()))?;

        tracing::info!("Emotion model loaded from {:?}", config.model_path);

        Ok(Self {
            session: Mutex::new(session),
            config: config.clone(),
        })
    }
}

#[cfg(feature = "onnx")]
impl EmotionClassifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f32>, InferenceError> {
        // [batch, features, channel]
        let input_shape = [1_usize, N_MFCC, 1];

        let input_tensor = Value::from_array((input_shape, features.to_vec()))
            .map_err(|e: ort::Error| InferenceError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Inference("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e: ort::Error| InferenceError::Inference(e.to_string()))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| InferenceError::Inference("No output from model".to_string()))?;

        let output_tensor = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| InferenceError::Inference(e.to_string()))?;

        let values: Vec<f32> = output_tensor.1.iter().copied().collect();

        tracing::debug!("Model output: {:?}", values);

        Ok(values)
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.config.model_path.display())
    }
}

// Stub implementation when feature is not enabled
#[cfg(not(feature = "onnx"))]
pub struct OnnxClassifier;

#[cfg(not(feature = "onnx"))]
impl OnnxClassifier {
    pub fn load(_config: &ModelConfig) -> Result<Self, InferenceError> {
        Err(InferenceError::FeatureNotEnabled)
    }
}

#[cfg(not(feature = "onnx"))]
impl EmotionClassifier for OnnxClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError::FeatureNotEnabled)
    }
}
