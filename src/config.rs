//! Service configuration loaded from an optional JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::model::ModelConfig;

/// Model file expected next to the executable
pub const DEFAULT_MODEL_FILENAME: &str = "model.onnx";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,

    // Model
    pub model_path: Option<PathBuf>,
    pub onnx_threads: usize,

    // Streaming socket input is raw f32 with no rate negotiation
    pub stream_sample_rate: u32,

    // Uploads
    pub max_upload_bytes: usize,
    pub temp_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: None,
            onnx_threads: 1,
            stream_sample_rate: 44100,
            max_upload_bytes: 50 * 1024 * 1024,
            temp_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Load config from file, or use defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Directory containing the running executable
    pub fn program_dir() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Failed to locate executable")?;
        exe.parent()
            .map(Path::to_path_buf)
            .context("Executable has no parent directory")
    }

    /// Get the model file path
    pub fn get_model_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.model_path {
            Ok(path.clone())
        } else {
            Ok(Self::program_dir()?.join(DEFAULT_MODEL_FILENAME))
        }
    }

    pub fn model_config(&self) -> Result<ModelConfig> {
        Ok(ModelConfig {
            n_threads: self.onnx_threads.max(1),
            ..ModelConfig::with_model_path(self.get_model_path()?)
        })
    }

    /// Address to bind the HTTP listener to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
