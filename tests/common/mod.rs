#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use musicbox::integrations::media_probe::MediaProbe;
use musicbox::integrations::playback::{PlaybackEngine, PlaybackState};
use musicbox::session::{PlayerSession, SessionHandle, SessionWorker};

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().expect("lock events").clone()
}

/// Records every engine call as a short string.
pub struct ScriptedEngine {
    events: EventLog,
    media: Option<PathBuf>,
    state: PlaybackState,
}

impl ScriptedEngine {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            media: None,
            state: PlaybackState::Stopped,
        }
    }

    fn record(&self, event: String) {
        self.events.lock().expect("lock events").push(event);
    }
}

impl PlaybackEngine for ScriptedEngine {
    fn load(&mut self, media: &Path) -> Result<()> {
        let name = media
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(format!("load:{name}"));
        self.media = Some(media.to_path_buf());
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.record("play".to_string());
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record("pause".to_string());
        self.state = PlaybackState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record("stop".to_string());
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn set_volume(&mut self, value: u8) -> Result<()> {
        self.record(format!("volume:{value}"));
        Ok(())
    }

    fn position(&mut self) -> Result<f64> {
        if self.media.is_some() {
            Ok(0.25)
        } else {
            Err(anyhow!("nothing loaded"))
        }
    }

    fn loaded_media(&self) -> Option<&Path> {
        self.media.as_deref()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.record("shutdown".to_string());
        self.media = None;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}

/// Every file is reported as two minutes long.
pub struct StaticProbe;

impl MediaProbe for StaticProbe {
    fn duration(&self, _path: &Path) -> Result<Option<Duration>> {
        Ok(Some(Duration::from_secs(120)))
    }
}

/// Writes placeholder audio files and returns their paths in order.
pub fn audio_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, b"not really audio").expect("write audio file");
            path
        })
        .collect()
}

pub fn scripted_session(log: &EventLog) -> PlayerSession {
    PlayerSession::new(
        Box::new(ScriptedEngine::new(log.clone())),
        Box::new(StaticProbe),
        80,
    )
    .expect("create session")
}

pub fn spawn_scripted(log: &EventLog) -> (SessionHandle, SessionWorker) {
    let log = log.clone();
    SessionHandle::spawn(move || Ok(scripted_session(&log))).expect("spawn session")
}

/// Writes `<name>` into the output directory instead of fetching anything.
pub struct FakeDownloader {
    pub name: String,
}

impl musicbox::integrations::downloader::AudioDownloader for FakeDownloader {
    fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        if url.contains("broken") {
            return Err(anyhow!("yt-dlp exited with status 1"));
        }
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(&self.name);
        std::fs::write(&path, b"downloaded audio")?;
        Ok(path)
    }
}
