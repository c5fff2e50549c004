//! MFCC extraction reduced to a single mean vector.

use ndarray::{Array1, Array2, Axis};
use realfft::{num_complex::Complex, RealFftPlanner, RealToComplex};
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;

use super::mel::mel_filterbank;
use super::{FeatureError, FeatureVector, N_MFCC};
use crate::audio::Waveform;

/// Configuration for MFCC extraction
///
/// Defaults follow the common audio-analysis library settings the
/// classifier was trained with.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// FFT size (also the window length)
    pub n_fft: usize,

    /// Hop length between frames (in samples)
    pub hop_length: usize,

    /// Number of mel frequency bands
    pub n_mels: usize,

    /// Minimum frequency for mel filterbank (Hz)
    pub fmin: f32,

    /// Maximum frequency for mel filterbank (Hz); Nyquist when unset
    pub fmax: Option<f32>,

    /// Power floor before taking the log
    pub amin: f32,

    /// Dynamic range kept below the loudest bin (dB)
    pub top_db: Option<f32>,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: None,
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }
}

/// Extracts a [`FeatureVector`] from a waveform.
///
/// The FFT plan, window and DCT basis only depend on the config and are
/// built once; the mel filterbank depends on the sample rate and is built
/// per call.
pub struct MfccExtractor {
    config: MfccConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    dct_basis: Array2<f32>,
}

impl MfccExtractor {
    /// Create a new extractor with the given configuration
    pub fn new(config: MfccConfig) -> Result<Self, FeatureError> {
        if config.n_fft < 2 || config.hop_length == 0 {
            return Err(FeatureError::InvalidConfig(format!(
                "n_fft={} hop_length={}",
                config.n_fft, config.hop_length
            )));
        }
        if config.n_mels < N_MFCC {
            return Err(FeatureError::InvalidConfig(format!(
                "n_mels={} must be at least {}",
                config.n_mels, N_MFCC
            )));
        }

        // Periodic Hann window
        let window: Vec<f32> = (0..config.n_fft)
            .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / config.n_fft as f64).cos()) as f32)
            .collect();

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.n_fft);

        let dct_basis = dct_ortho_basis(N_MFCC, config.n_mels);

        Ok(Self {
            config,
            fft,
            window,
            dct_basis,
        })
    }

    pub fn config(&self) -> &MfccConfig {
        &self.config
    }

    /// Compute the time-averaged MFCC vector of a waveform
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureVector, FeatureError> {
        if waveform.is_empty() {
            return Err(FeatureError::EmptyAudio);
        }
        if waveform.samples().iter().any(|s| !s.is_finite()) {
            return Err(FeatureError::NonFiniteInput);
        }

        let power = self.power_spectrogram(waveform.samples())?;

        let sample_rate = waveform.sample_rate() as f64;
        let fmax = self
            .config
            .fmax
            .map(|f| f as f64)
            .unwrap_or(sample_rate / 2.0);
        let filterbank = mel_filterbank(
            sample_rate,
            self.config.n_fft,
            self.config.n_mels,
            self.config.fmin as f64,
            fmax,
        );

        // [frames, bins] x [bins, mels] -> [frames, mels]
        let mel_spec = power.dot(&filterbank.t());
        let mel_db = self.power_to_db(mel_spec);

        // [frames, mels] x [mels, n_mfcc] -> [frames, n_mfcc]
        let mfcc = mel_db.dot(&self.dct_basis.t());

        let mean: Array1<f32> = mfcc.mean_axis(Axis(0)).ok_or(FeatureError::EmptyAudio)?;

        debug!(
            "Extracted MFCCs: {} frames at {} Hz",
            mfcc.nrows(),
            waveform.sample_rate()
        );

        let values: [f32; N_MFCC] = std::array::from_fn(|i| mean[i]);
        Ok(FeatureVector::new(values))
    }

    /// Centered STFT power spectrogram as `[frames, n_fft / 2 + 1]`
    fn power_spectrogram(&self, samples: &[f32]) -> Result<Array2<f32>, FeatureError> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let pad = n_fft / 2;

        // Zero padding on both sides so frame t is centered on sample t * hop
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_frames = 1 + (padded.len() - n_fft) / hop;
        let n_bins = n_fft / 2 + 1;

        let mut spectrogram = Array2::<f32>::zeros((n_frames, n_bins));
        let mut fft_input = vec![0.0f32; n_fft];
        let mut fft_output = vec![Complex::new(0.0f32, 0.0); n_bins];

        for (frame_idx, mut row) in spectrogram.outer_iter_mut().enumerate() {
            let start = frame_idx * hop;
            for (i, (dst, &sample)) in fft_input
                .iter_mut()
                .zip(&padded[start..start + n_fft])
                .enumerate()
            {
                *dst = sample * self.window[i];
            }

            self.fft
                .process(&mut fft_input, &mut fft_output)
                .map_err(|e| FeatureError::Fft(e.to_string()))?;

            for (dst, c) in row.iter_mut().zip(&fft_output) {
                *dst = c.re * c.re + c.im * c.im;
            }
        }

        Ok(spectrogram)
    }

    /// Convert power to decibels relative to 1.0, clipped to `top_db`
    fn power_to_db(&self, power: Array2<f32>) -> Array2<f32> {
        let amin = self.config.amin;
        let mut db = power.mapv_into(|p| 10.0 * p.max(amin).log10());

        if let Some(top_db) = self.config.top_db {
            let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let floor = peak - top_db;
            db.mapv_inplace(|v| v.max(floor));
        }

        db
    }
}

/// Orthonormal DCT-II basis as `[n_out, n_in]`
fn dct_ortho_basis(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        (scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()) as f32
    })
}
