//! Bidirectional event channel for streaming audio.
//!
//! Binary frames are `audio_data` payloads of raw little-endian f32 samples.
//! Text frames carry a JSON envelope (`{"event": ..., "data": ...}`). Each
//! inbound message gets exactly one `emotion_result` or `error` event back.
//!
//! The sample rate is fixed by configuration and never negotiated with the
//! client; audio recorded at another rate skews the features silently.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::routes::AppState;
use super::types::{ClientEvent, ServerEvent};
use crate::audio::{decode_f32le, Waveform};
use crate::error::AnalysisError;
use crate::pipeline::EmotionAnalyzer;

/// `GET /socket`: upgrade to a WebSocket
pub async fn socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!("Socket {} connected", connection_id);

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Socket {} receive error: {}", connection_id, e);
                break;
            }
        };

        let event = match msg {
            Message::Binary(bytes) => run_blocking(&state, move |analyzer, rate| {
                handle_audio_data(analyzer, &bytes, rate)
            })
            .await,
            Message::Text(text) => run_blocking(&state, move |analyzer, rate| {
                handle_text_frame(analyzer, &text, rate)
            })
            .await,
            Message::Close(_) => break,
            // Ping/pong are answered by axum
            _ => continue,
        };

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Socket {} failed to serialize event: {}", connection_id, e);
                continue;
            }
        };

        debug!("Socket {} -> {}", connection_id, payload);

        if socket.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }

    info!("Socket {} disconnected", connection_id);
}

/// Run one message's analysis off the async runtime
async fn run_blocking<F>(state: &AppState, f: F) -> ServerEvent
where
    F: FnOnce(&EmotionAnalyzer, u32) -> ServerEvent + Send + 'static,
{
    let analyzer = state.analyzer.clone();
    let rate = state.stream_sample_rate;

    match tokio::task::spawn_blocking(move || f(analyzer.as_ref(), rate)).await {
        Ok(event) => event,
        Err(e) => ServerEvent::error(format!("Analysis task failed: {}", e)),
    }
}

/// Handle an `audio_data` binary payload
pub fn handle_audio_data(analyzer: &EmotionAnalyzer, bytes: &[u8], sample_rate: u32) -> ServerEvent {
    let result = decode_f32le(bytes, sample_rate)
        .map_err(AnalysisError::from)
        .and_then(|waveform| analyzer.analyze(&waveform));

    if let Err(ref e) = result {
        warn!("audio_data rejected ({}): {}", e.kind(), e);
    }
    ServerEvent::from(result)
}

/// Handle a JSON text envelope
pub fn handle_text_frame(analyzer: &EmotionAnalyzer, text: &str, sample_rate: u32) -> ServerEvent {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Unrecognized socket message: {}", e);
            return ServerEvent::error(format!("Invalid event: {}", e));
        }
    };

    match event {
        ClientEvent::AudioData(samples) => {
            let result = Waveform::new(samples, sample_rate)
                .map_err(AnalysisError::from)
                .and_then(|waveform| analyzer.analyze(&waveform));
            ServerEvent::from(result)
        }
    }
}
