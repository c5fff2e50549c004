//! Speech emotion classification service.
//!
//! Audio arrives as an uploaded file, an in-memory container, or a raw
//! float stream. Each is decoded to a [`audio::Waveform`], reduced to a
//! 13-coefficient mean MFCC vector, and classified into one of
//! [`emotion::Emotion::ALL`].

pub mod audio;
pub mod config;
pub mod emotion;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod server;

pub use emotion::{aggregate, AnalysisOutcome, Emotion};
pub use error::AnalysisError;
pub use pipeline::EmotionAnalyzer;
