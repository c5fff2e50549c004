//! Audio input handling.
//!
//! Every transport adapter turns its payload into a [`Waveform`]: mono
//! samples plus the rate they were recorded at. Decoders live in
//! [`decode`].

pub mod decode;

pub use decode::{decode_container, decode_f32le, decode_file};

use thiserror::Error;

/// Errors that can occur while decoding audio input
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Corrupt audio stream: {0}")]
    Corrupt(String),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Buffer length {0} is not a multiple of 4 bytes")]
    MisalignedBuffer(usize),

    #[error("Audio contains no samples")]
    Empty,
}

/// Mono audio samples at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from mono samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a waveform from interleaved samples, averaging channels to mono
    pub fn from_interleaved(
        samples: Vec<f32>,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, DecodeError> {
        if channels <= 1 {
            return Self::new(samples, sample_rate);
        }

        let mono = samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Self::new(mono, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
