use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use super::vlc_http::VlcHttpEngine;
use super::vlc_process::VlcProcessEngine;
use crate::storage::config::{PlaybackConfig, PlaybackMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

pub trait PlaybackEngine: Send {
    /// Replaces the loaded media with `media` and starts playing it.
    fn load(&mut self, media: &Path) -> Result<()>;
    /// Resumes or restarts the loaded media.
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn set_volume(&mut self, value: u8) -> Result<()>;
    /// Playback position as a fraction of the media length.
    fn position(&mut self) -> Result<f64>;
    fn loaded_media(&self) -> Option<&Path>;
    fn shutdown(&mut self) -> Result<()>;
    fn state(&self) -> PlaybackState;
}

pub fn volume_percent_to_vlc_scale(value: u8) -> u16 {
    // VLC's RC/HTTP volume uses a 0-512 scale with 256 as nominal 100%.
    ((u16::from(value.min(100)) * 256) + 50) / 100
}

pub fn engine_from_config(config: &PlaybackConfig) -> Result<Box<dyn PlaybackEngine>> {
    match config.mode {
        PlaybackMode::Process => Ok(Box::new(VlcProcessEngine::new_with_program(
            config.vlc_program.clone(),
        ))),
        PlaybackMode::Http => Ok(Box::new(VlcHttpEngine::new_with_timeout(
            config.http_url.clone(),
            config.http_password.clone(),
            Duration::from_millis(config.http_timeout_ms),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_scale_matches_vlc_nominal() {
        assert_eq!(volume_percent_to_vlc_scale(0), 0);
        assert_eq!(volume_percent_to_vlc_scale(80), 205);
        assert_eq!(volume_percent_to_vlc_scale(100), 256);
        assert_eq!(volume_percent_to_vlc_scale(250), 256);
    }
}
