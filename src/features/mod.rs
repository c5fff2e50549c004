//! Acoustic feature extraction.
//!
//! Audio is reduced to a fixed-size vector of time-averaged MFCCs:
//! 1. Short-time power spectrum (centered Hann frames)
//! 2. Slaney mel filterbank and dB scaling
//! 3. Orthonormal DCT-II, first 13 coefficients
//! 4. Mean over frames

pub mod mel;
pub mod mfcc;

pub use mfcc::{MfccConfig, MfccExtractor};

use thiserror::Error;

/// Number of cepstral coefficients the classifier expects
pub const N_MFCC: usize = 13;

/// Errors that can occur during feature extraction
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Audio contains non-finite samples")]
    NonFiniteInput,

    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    #[error("FFT failed: {0}")]
    Fft(String),
}

/// Time-averaged MFCC vector, one value per coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; N_MFCC]);

impl FeatureVector {
    pub fn new(values: [f32; N_MFCC]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}
