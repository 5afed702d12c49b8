use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::Visibility;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub workspace: Workspace,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Workspace {
    /// Root directory holding one artifact directory per collection
    pub artifact_dir: PathBuf,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("temp"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArchiveConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://archive.org".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub preset: String,
    pub crf: u8,
    pub width: u32,
    pub height: u32,
    pub audio_bitrate: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            preset: "slow".to_string(),
            crf: 18,
            width: 1920,
            height: 1080,
            audio_bitrate: "192k".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PublishConfig {
    pub api_base: String,
    pub upload_base: String,
    /// JSON file holding an OAuth `access_token`, obtained out of band
    pub token_path: PathBuf,
    pub default_visibility: Visibility,
    pub category_id: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/youtube/v3".to_string(),
            token_path: PathBuf::from("config/client_token.json"),
            default_visibility: Visibility::Private,
            category_id: "10".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 18765,
        }
    }
}
