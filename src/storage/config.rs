use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const DEFAULT_VLC_PROGRAM: &str = "cvlc";
const DEFAULT_VLC_HTTP_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_VLC_HTTP_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_VOLUME: u8 = 80;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_MB: u64 = 200;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Process,
    Http,
}

impl PlaybackMode {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "process" => Ok(Self::Process),
            "http" => Ok(Self::Http),
            _ => Err(anyhow!(
                "invalid playback mode '{value}' (expected process or http)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub mode: PlaybackMode,
    pub vlc_program: String,
    pub http_url: String,
    pub http_password: String,
    pub http_timeout_ms: u64,
    pub initial_volume: u8,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Process,
            vlc_program: DEFAULT_VLC_PROGRAM.to_string(),
            http_url: DEFAULT_VLC_HTTP_URL.to_string(),
            http_password: String::new(),
            http_timeout_ms: DEFAULT_VLC_HTTP_TIMEOUT_MS,
            initial_volume: DEFAULT_VOLUME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
    pub downloads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub program: String,
    pub audio_format: String,
    pub audio_quality: String,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192".to_string(),
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub playback: PlaybackConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub download: DownloadConfig,
}

impl RuntimeConfig {
    pub fn config_dir() -> PathBuf {
        env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/musicbox")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed parsing config TOML: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("{}", err.message()))
    }

    fn merge_env(&mut self) -> Result<()> {
        if let Ok(mode) = env::var("MUSICBOX_PLAYBACK_MODE") {
            self.playback.mode = PlaybackMode::parse(&mode)
                .with_context(|| "invalid MUSICBOX_PLAYBACK_MODE".to_string())?;
        }
        if let Ok(program) = env::var("MUSICBOX_VLC_PROGRAM") {
            self.playback.vlc_program = program;
        }
        if let Ok(url) = env::var("MUSICBOX_VLC_HTTP_URL") {
            self.playback.http_url = url;
        }
        if let Ok(password) = env::var("MUSICBOX_VLC_HTTP_PASSWORD") {
            self.playback.http_password = password;
        }
        if let Ok(volume) = env::var("MUSICBOX_VOLUME") {
            self.playback.initial_volume = volume
                .parse::<u8>()
                .with_context(|| "invalid MUSICBOX_VOLUME".to_string())?;
        }

        if let Ok(host) = env::var("MUSICBOX_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("MUSICBOX_PORT") {
            self.server.port = port
                .parse::<u16>()
                .with_context(|| "invalid MUSICBOX_PORT".to_string())?;
        }

        if let Ok(dir) = env::var("MUSICBOX_UPLOADS_DIR") {
            self.storage.uploads_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("MUSICBOX_DOWNLOADS_DIR") {
            self.storage.downloads_dir = PathBuf::from(dir);
        }

        if let Ok(program) = env::var("MUSICBOX_YTDLP_PROGRAM") {
            self.download.program = program;
        }
        if let Ok(timeout) = env::var("MUSICBOX_DOWNLOAD_TIMEOUT_SECS") {
            self.download.timeout_secs = timeout
                .parse::<u64>()
                .with_context(|| "invalid MUSICBOX_DOWNLOAD_TIMEOUT_SECS".to_string())?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.playback.initial_volume > 100 {
            return Err(anyhow!(
                "initial_volume {} is out of range (expected 0-100)",
                self.playback.initial_volume
            ));
        }
        if self.playback.vlc_program.trim().is_empty() {
            return Err(anyhow!("vlc_program cannot be empty"));
        }
        if self.download.program.trim().is_empty() {
            return Err(anyhow!("download program cannot be empty"));
        }
        if self.download.timeout_secs == 0 {
            return Err(anyhow!("download timeout_secs must be greater than 0"));
        }
        if self.download.audio_quality.trim().parse::<u32>().is_err() {
            return Err(anyhow!(
                "invalid audio_quality '{}' (expected kbps, e.g. 192)",
                self.download.audio_quality
            ));
        }
        Ok(())
    }
}
