mod handle;

pub use handle::{SessionHandle, SessionWorker};

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::errors::{PlayerError, PlayerResult};
use crate::domain::models::{PlayerStatus, PlaylistView, TrackInfo};
use crate::domain::playlist::Playlist;
use crate::integrations::media_probe::{DurationCache, MediaProbe};
use crate::integrations::playback::{PlaybackEngine, PlaybackState};

/// Owns the playlist, the playback engine and the volume. Every front end
/// drives the player through one of these, usually behind a [`SessionHandle`].
pub struct PlayerSession {
    playlist: Playlist,
    engine: Box<dyn PlaybackEngine>,
    durations: DurationCache,
    volume: u8,
}

impl PlayerSession {
    pub fn new(
        engine: Box<dyn PlaybackEngine>,
        probe: Box<dyn MediaProbe>,
        initial_volume: u8,
    ) -> PlayerResult<Self> {
        let mut session = Self {
            playlist: Playlist::new(),
            engine,
            durations: DurationCache::new(probe),
            volume: 0,
        };
        session.set_volume(i64::from(initial_volume))?;
        Ok(session)
    }

    /// Appends every existing, not yet listed path, made absolute so an
    /// out-of-process VLC resolves it the same way. Missing files and
    /// duplicates are skipped. Returns how many tracks were added.
    pub fn add<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                debug!(path = %path.display(), "skipping missing file");
                continue;
            }
            let path = match std::path::absolute(path) {
                Ok(path) => path,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping unresolvable path");
                    continue;
                }
            };
            if self.playlist.push(path) {
                added += 1;
            }
        }
        if added > 0 {
            info!(added, total = self.playlist.len(), "tracks added");
        }
        added
    }

    /// Adds a single track and describes it. A path already in the playlist
    /// returns the existing entry.
    pub fn add_track(&mut self, path: impl AsRef<Path>) -> PlayerResult<TrackInfo> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PlayerError::FileNotFound(path.to_path_buf()));
        }
        let path = std::path::absolute(path)?;
        self.add([&path]);
        let index = self
            .playlist
            .position_of(&path)
            .ok_or_else(|| PlayerError::FileNotFound(path.clone()))?;
        Ok(self.track_info(index, path))
    }

    pub fn remove(&mut self, index: usize) -> PlayerResult<PathBuf> {
        let removed = self.playlist.remove(index)?;
        self.durations.forget(&removed);
        info!(index, path = %removed.display(), "track removed");
        Ok(removed)
    }

    /// Empties the playlist even when the engine refuses to stop.
    pub fn clear(&mut self) -> PlayerResult<()> {
        if let Err(err) = self.stop() {
            warn!(error = %err, "failed to stop playback while clearing playlist");
        }
        self.playlist.clear();
        self.durations.clear();
        info!("playlist cleared");
        Ok(())
    }

    /// Plays the track at `index`, or resumes/starts the current one.
    pub fn play(&mut self, index: Option<usize>) -> PlayerResult<()> {
        if self.playlist.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }

        match index {
            Some(index) => self.play_index(index),
            None => {
                let current = self.playlist.current().map(Path::to_path_buf);
                let loaded = self.engine.loaded_media().map(Path::to_path_buf);
                match (current, loaded) {
                    (Some(current), Some(loaded)) if current == loaded => {
                        self.engine.play()?;
                        Ok(())
                    }
                    _ => {
                        let index = self.playlist.current_index().unwrap_or(0);
                        self.play_index(index)
                    }
                }
            }
        }
    }

    pub fn toggle_play_pause(&mut self) -> PlayerResult<()> {
        if self.engine.state() == PlaybackState::Playing {
            self.pause()
        } else {
            self.play(None)
        }
    }

    pub fn pause(&mut self) -> PlayerResult<()> {
        if self.engine.loaded_media().is_none() || self.engine.state() != PlaybackState::Playing {
            return Ok(());
        }
        self.engine.pause()?;
        Ok(())
    }

    pub fn stop(&mut self) -> PlayerResult<()> {
        if self.engine.loaded_media().is_none() || self.engine.state() == PlaybackState::Stopped {
            return Ok(());
        }
        self.engine.stop()?;
        Ok(())
    }

    pub fn next(&mut self) -> PlayerResult<()> {
        match self.playlist.next_index() {
            Some(index) => self.play_index(index),
            None => Ok(()),
        }
    }

    pub fn previous(&mut self) -> PlayerResult<()> {
        match self.playlist.previous_index() {
            Some(index) => self.play_index(index),
            None => Ok(()),
        }
    }

    /// Clamps `value` into 0..=100 and applies it. Returns the applied volume.
    pub fn set_volume(&mut self, value: i64) -> PlayerResult<u8> {
        let volume = value.clamp(0, 100) as u8;
        self.engine.set_volume(volume)?;
        self.volume = volume;
        Ok(volume)
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn current_track(&self) -> Option<&Path> {
        self.playlist.current()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.playlist.current_index()
    }

    pub fn tracks(&self) -> &[PathBuf] {
        self.playlist.tracks()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.engine.state()
    }

    pub fn playlist_view(&mut self) -> PlaylistView {
        let tracks = self
            .playlist
            .tracks()
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(index, path)| self.track_info(index, path))
            .collect();
        PlaylistView {
            tracks,
            current_index: self.playlist.current_index(),
        }
    }

    pub fn status(&mut self) -> PlayerStatus {
        let fraction = match self.engine.position() {
            Ok(fraction) => fraction,
            Err(err) => {
                debug!(error = %err, "playback position unavailable");
                0.0
            }
        };

        let state = self.engine.state();
        let current_track = self
            .playlist
            .current_index()
            .zip(self.playlist.current().map(Path::to_path_buf))
            .map(|(index, path)| self.track_info(index, path));
        let duration = current_track
            .as_ref()
            .and_then(|track| track.duration)
            .unwrap_or(0.0);

        PlayerStatus {
            is_playing: state == PlaybackState::Playing,
            is_paused: state == PlaybackState::Paused,
            current_track,
            position: fraction * duration,
            duration,
            volume: self.volume,
        }
    }

    pub fn shutdown(&mut self) -> PlayerResult<()> {
        self.engine.shutdown()?;
        Ok(())
    }

    /// The pointer only moves once the engine has accepted the track.
    fn play_index(&mut self, index: usize) -> PlayerResult<()> {
        let path = self.playlist.checked(index)?.to_path_buf();
        if let Err(err) = self.engine.load(&path) {
            warn!(index, path = %path.display(), error = %err, "failed to load track");
            return Err(err.into());
        }
        self.playlist.select(index)?;
        info!(index, path = %path.display(), "playing track");
        Ok(())
    }

    fn track_info(&mut self, index: usize, path: PathBuf) -> TrackInfo {
        let duration = self.durations.duration(&path);
        TrackInfo::new(index, &path, duration)
    }
}
