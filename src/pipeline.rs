//! Shared analysis path: waveform -> features -> probabilities -> label.
//!
//! All three transport adapters end up here after decoding.

use std::sync::Arc;
use tracing::{debug, info};

use crate::audio::Waveform;
use crate::emotion::{aggregate, AnalysisOutcome};
use crate::error::AnalysisError;
use crate::features::{MfccConfig, MfccExtractor};
use crate::model::EmotionClassifier;

/// Feature extractor plus classifier, shared read-only across requests
pub struct EmotionAnalyzer {
    extractor: MfccExtractor,
    model: Arc<dyn EmotionClassifier>,
}

impl EmotionAnalyzer {
    pub fn new(extractor: MfccExtractor, model: Arc<dyn EmotionClassifier>) -> Self {
        Self { extractor, model }
    }

    /// Analyzer with default MFCC settings
    pub fn with_model(model: Arc<dyn EmotionClassifier>) -> Result<Self, AnalysisError> {
        let extractor = MfccExtractor::new(MfccConfig::default())?;
        Ok(Self::new(extractor, model))
    }

    pub fn model(&self) -> &Arc<dyn EmotionClassifier> {
        &self.model
    }

    /// Classify one waveform
    pub fn analyze(&self, waveform: &Waveform) -> Result<AnalysisOutcome, AnalysisError> {
        debug!(
            "Analyzing {} samples at {} Hz ({:.2}s)",
            waveform.len(),
            waveform.sample_rate(),
            waveform.duration_secs()
        );

        let features = self.extractor.extract(waveform)?;
        debug!("Features: {:?}", features.as_slice());

        let probabilities = self.model.predict(&features)?;
        let outcome = aggregate(&probabilities)?;

        info!(
            "Detected emotion: {} ({:.0}%)",
            outcome.detected_emotion,
            outcome.confidence() * 100.0
        );

        Ok(outcome)
    }
}
