// Shared fixtures for integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use emotion_service::config::ServiceConfig;
use emotion_service::features::FeatureVector;
use emotion_service::model::{EmotionClassifier, InferenceError};
use emotion_service::server::{build_router, AppState};
use emotion_service::EmotionAnalyzer;

pub const BOUNDARY: &str = "emotion-test-boundary";

/// Deterministic classifier: softmax over the first four coefficients
pub struct SoftmaxHead;

impl EmotionClassifier for SoftmaxHead {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f32>, InferenceError> {
        let logits: Vec<f32> = features.as_slice()[..4].iter().map(|v| v / 100.0).collect();
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let sum: f32 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / sum).collect())
    }

    fn describe(&self) -> String {
        "softmax-head".to_string()
    }
}

/// Always returns the same output
pub struct FixedClassifier(pub Vec<f32>);

impl EmotionClassifier for FixedClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }
}

/// Always fails
pub struct FailingClassifier;

impl EmotionClassifier for FailingClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError::Inference("runtime unavailable".to_string()))
    }
}

pub fn analyzer(model: impl EmotionClassifier + 'static) -> Arc<EmotionAnalyzer> {
    Arc::new(EmotionAnalyzer::with_model(Arc::new(model)).unwrap())
}

pub fn app_with(model: impl EmotionClassifier + 'static, temp_dir: Option<&Path>) -> Router {
    let config = ServiceConfig {
        temp_dir: temp_dir.map(Path::to_path_buf),
        ..Default::default()
    };
    build_router(AppState::new(analyzer(model), &config))
}

pub fn app_with_config(model: impl EmotionClassifier + 'static, config: &ServiceConfig) -> Router {
    build_router(AppState::new(analyzer(model), config))
}

/// Sine wave samples
pub fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.4)
        .collect()
}

/// 16-bit mono WAV file bytes
pub fn wav_fixture(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// One second of 440 Hz at 22.05 kHz
pub fn sine_wav() -> Vec<u8> {
    wav_fixture(&sine(440.0, 22050, 1.0), 22050)
}

/// Build a multipart/form-data body from (field, filename, bytes) parts
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn f32le_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
