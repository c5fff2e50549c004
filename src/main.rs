use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use emotion_service::config::ServiceConfig;
use emotion_service::model::{EmotionClassifier, OnnxClassifier};
use emotion_service::server::{self, AppState};
use emotion_service::EmotionAnalyzer;

/// Speech emotion classification over HTTP and WebSocket
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the ONNX model (default: model.onnx next to the executable)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(model) = args.model {
        config.model_path = Some(model);
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let model_config = config.model_config()?;
    info!("Emotion service starting...");
    info!("Model: {:?}", model_config.model_path);

    // The service cannot answer anything without a model
    let model = OnnxClassifier::load(&model_config).context("Failed to load emotion model")?;
    let model: Arc<dyn EmotionClassifier> = Arc::new(model);

    let analyzer = EmotionAnalyzer::with_model(model)?;
    let state = AppState::new(Arc::new(analyzer), &config);

    server::serve(state, config.socket_addr()?).await
}
