use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration. Loaded by the binary via figment
/// (TOML file merged with `PIXELPRESS_`-prefixed environment variables);
/// every field has a default so a bare `pixelpress serve` works.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub content_store: ContentStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes.
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            max_request_size: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Scratch directory for staged uploads and fetched copies. Never served.
    pub upload_dir: PathBuf,
    /// Durable directory for transformed artifacts, served at `/optimized/`.
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("optimized"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Default compression quality for directly uploaded images.
    pub upload_quality: u8,
    /// Default compression quality for URL-sourced images. Intentionally
    /// different from the upload default; both are observed behavior.
    pub url_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_quality: 80,
            url_quality: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    /// When false, compress responses carry a null content identifier.
    pub enabled: bool,
    /// IPFS HTTP API endpoint.
    pub api_url: String,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "http://127.0.0.1:5001".to_string(),
        }
    }
}
