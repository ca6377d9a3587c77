use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use super::playback::{volume_percent_to_vlc_scale, PlaybackEngine, PlaybackState};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Deserialize)]
struct VlcStatus {
    #[serde(default)]
    state: String,
    #[serde(default)]
    position: f64,
}

/// Talks to an already running VLC with the web interface enabled
/// (`vlc --extraintf http --http-password ...`).
pub struct VlcHttpEngine {
    client: Client,
    base_url: String,
    password: String,
    media: Option<PathBuf>,
    state: PlaybackState,
}

impl VlcHttpEngine {
    pub fn new(base_url: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::new_with_timeout(base_url, password, DEFAULT_TIMEOUT)
    }

    pub fn new_with_timeout(
        base_url: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build VLC HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            password: password.into(),
            media: None,
            state: PlaybackState::Stopped,
        })
    }

    fn send_command(&self, command: Option<&str>, params: &[(&str, String)]) -> Result<VlcStatus> {
        let mut request = self
            .client
            .get(format!("{}/requests/status.json", self.base_url))
            .basic_auth("", Some(self.password.clone()));

        if let Some(command) = command {
            request = request.query(&[("command", command)]);
        }
        if !params.is_empty() {
            request = request.query(params);
        }

        let label = command.unwrap_or("status");
        let response = request.send().with_context(|| {
            format!(
                "failed sending VLC HTTP command to {}; enable VLC web interface and verify host/port",
                self.base_url
            )
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(anyhow!(
                "VLC HTTP authentication failed (401); check MUSICBOX_VLC_HTTP_PASSWORD"
            ));
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("VLC HTTP command '{label}' returned HTTP {status}"))?;

        response
            .json::<VlcStatus>()
            .with_context(|| format!("failed to parse VLC status after '{label}'"))
    }

    fn apply_status(&mut self, status: &VlcStatus) {
        self.state = match status.state.as_str() {
            "playing" => PlaybackState::Playing,
            "paused" => PlaybackState::Paused,
            _ => PlaybackState::Stopped,
        };
    }
}

impl PlaybackEngine for VlcHttpEngine {
    fn load(&mut self, media: &Path) -> Result<()> {
        let input = media.to_string_lossy().into_owned();
        self.send_command(Some("pl_empty"), &[])?;
        self.send_command(Some("in_play"), &[("input", input)])?;
        self.media = Some(media.to_path_buf());
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.media.is_none() {
            return Err(anyhow!("cannot play because no media is loaded"));
        }
        match self.state {
            PlaybackState::Playing => return Ok(()),
            PlaybackState::Paused => {
                self.send_command(Some("pl_forceresume"), &[])?;
            }
            PlaybackState::Stopped => {
                self.send_command(Some("pl_play"), &[])?;
            }
        }
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Err(anyhow!(
                "cannot pause because no track is currently playing; start playback first"
            ));
        }
        self.send_command(Some("pl_forcepause"), &[])?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.state == PlaybackState::Stopped {
            return Err(anyhow!(
                "cannot stop because playback is already stopped"
            ));
        }
        self.send_command(Some("pl_stop"), &[])?;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn set_volume(&mut self, value: u8) -> Result<()> {
        let scaled = volume_percent_to_vlc_scale(value).to_string();
        self.send_command(Some("volume"), &[("val", scaled)])?;
        Ok(())
    }

    fn position(&mut self) -> Result<f64> {
        let status = self.send_command(None, &[])?;
        self.apply_status(&status);
        Ok(status.position.clamp(0.0, 1.0))
    }

    fn loaded_media(&self) -> Option<&Path> {
        self.media.as_deref()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.state != PlaybackState::Stopped {
            self.send_command(Some("pl_stop"), &[])?;
        }
        self.media = None;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}
