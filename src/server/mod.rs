//! HTTP and WebSocket transport.
//!
//! ## Endpoints
//!
//! - `POST /analyze` - multipart `audio` file, decoded via a scoped temp file
//! - `POST /realtime` - multipart `audio` bytes, decoded in memory
//! - `GET /socket` - WebSocket; binary frames are raw f32 `audio_data`
//! - `GET /health` - liveness probe
//!
//! ## Responses
//!
//! ```json
//! {
//!     "detected_emotion": "Happy",
//!     "probabilities": { "Angry": 0.05, "Happy": 0.81, "Neutral": 0.1, "Sad": 0.04 }
//! }
//! ```
//!
//! Failures return `{"error": ..., "kind": ...}` with a status that depends
//! on the kind of failure (see [`types::status_for`]).

mod handlers;
mod routes;
mod socket;
pub mod types;

pub use handlers::{analyze_upload, AudioUpload};
pub use routes::{build_router, serve, AppState};
pub use socket::{handle_audio_data, handle_text_frame};
