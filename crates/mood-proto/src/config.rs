use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Where the playlist daemon listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// How the client reaches the playlist daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Detection tick period.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Labels that never trigger an automatic refresh.
    #[serde(default = "default_excluded_labels")]
    pub excluded_labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Passed to the detector's `load_parameters`.
    #[serde(default = "default_model_source")]
    pub source_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Playlist catalog read by the daemon.
    #[serde(default = "default_playlists_toml")]
    pub playlists_toml: PathBuf,
    /// Genres offered by the client, bound to keys 1-9 in order.
    #[serde(default = "default_genres")]
    pub genres: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            excluded_labels: default_excluded_labels(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source_uri: default_model_source(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: default_camera_width(),
            height: default_camera_height(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            playlists_toml: default_playlists_toml(),
            genres: default_genres(),
        }
    }
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_base_url() -> String {
    format!("http://{}:{}", default_bind_address(), default_port())
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_interval_ms() -> u64 {
    100
}

fn default_excluded_labels() -> Vec<String> {
    vec!["surprised".to_string()]
}

fn default_model_source() -> String {
    platform::data_dir()
        .join("detections.json")
        .to_string_lossy()
        .into_owned()
}

fn default_camera_width() -> u32 {
    640
}

fn default_camera_height() -> u32 {
    480
}

fn default_playlists_toml() -> PathBuf {
    platform::config_dir().join("playlists.toml")
}

fn default_genres() -> Vec<String> {
    ["pop", "rock", "jazz", "classical", "hiphop"]
        .iter()
        .map(|g| g.to_string())
        .collect()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
