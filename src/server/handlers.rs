//! HTTP handlers for file and in-memory analysis.

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use super::routes::AppState;
use super::types::ApiError;
use crate::audio::{decode_container, decode_file};
use crate::emotion::AnalysisOutcome;
use crate::error::AnalysisError;
use crate::pipeline::EmotionAnalyzer;

const NO_AUDIO_FILE: &str = "No audio file provided";
const NO_AUDIO_DATA: &str = "No audio data provided";

/// Form field carrying the audio in both endpoints
const AUDIO_FIELD: &str = "audio";

/// Extension used for temp files when the upload has none
const DEFAULT_UPLOAD_EXTENSION: &str = "wav";

/// The `audio` part of a multipart form
#[derive(Debug)]
pub struct AudioUpload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl AudioUpload {
    /// Temp file suffix derived from the uploaded file name
    fn temp_suffix(&self) -> String {
        let ext = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(DEFAULT_UPLOAD_EXTENSION);
        format!(".{}", ext.to_ascii_lowercase())
    }
}

/// `POST /analyze`: classify an uploaded audio file
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    let upload = require_audio(multipart, NO_AUDIO_FILE).await?;

    info!(
        "Analyze request: {:?} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    let analyzer = state.analyzer.clone();
    let temp_dir = state.temp_dir.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        analyze_upload(&analyzer, &upload, temp_dir.as_deref())
    })
    .await
    .map_err(|e| AnalysisError::Internal(format!("Analysis task failed: {}", e)))??;

    Ok(Json(outcome))
}

/// `POST /realtime`: classify an in-memory audio container
pub async fn realtime(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    let upload = require_audio(multipart, NO_AUDIO_DATA).await?;

    info!("Realtime request: {} bytes", upload.bytes.len());

    let analyzer = state.analyzer.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<AnalysisOutcome, AnalysisError> {
        let waveform = decode_container(&upload.bytes)?;
        analyzer.analyze(&waveform)
    })
    .await
    .map_err(|e| AnalysisError::Internal(format!("Analysis task failed: {}", e)))??;

    Ok(Json(outcome))
}

/// Pull the `audio` field out of the form, or fail with `missing`.
///
/// A body that is not multipart, or is cut off mid-field, has no usable
/// audio field either. Only an over-limit body is reported separately.
async fn require_audio(
    multipart: Result<Multipart, MultipartRejection>,
    missing: &'static str,
) -> Result<AudioUpload, ApiError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Not a multipart request: {}", rejection.body_text());
            return Err(AnalysisError::MissingInput(missing).into());
        }
    };

    match read_audio_field(&mut multipart).await {
        Ok(Some(upload)) => Ok(upload),
        Ok(None) => Err(AnalysisError::MissingInput(missing).into()),
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge(e.body_text()))
        }
        Err(e) => {
            warn!("Malformed multipart body: {}", e.body_text());
            Err(AnalysisError::MissingInput(missing).into())
        }
    }
}

async fn read_audio_field(multipart: &mut Multipart) -> Result<Option<AudioUpload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some(AudioUpload { file_name, bytes }));
    }
    Ok(None)
}

/// Write the upload to a scoped temp file, decode it, and classify it.
///
/// The temp file is removed when `temp` drops, on every return path.
pub fn analyze_upload(
    analyzer: &EmotionAnalyzer,
    upload: &AudioUpload,
    temp_dir: Option<&Path>,
) -> Result<AnalysisOutcome, AnalysisError> {
    let suffix = upload.temp_suffix();
    let mut builder = tempfile::Builder::new();
    builder.prefix("upload-").suffix(&suffix);

    let mut temp = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    temp.write_all(&upload.bytes)?;
    temp.flush()?;

    let waveform = decode_file(temp.path())?;
    analyzer.analyze(&waveform)
}
