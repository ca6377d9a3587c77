use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackInfo {
    pub id: usize,
    pub title: String,
    pub filename: String,
    pub path: String,
    pub duration: Option<f64>,
}

impl TrackInfo {
    pub fn new(id: usize, path: &Path, duration: Option<Duration>) -> Self {
        Self {
            id,
            title: track_title(path),
            filename: file_name(path),
            path: path.to_string_lossy().into_owned(),
            duration: duration.map(|d| d.as_secs_f64()),
        }
    }

    /// `m:ss` rendering of the duration, or `--:--` when unknown.
    pub fn duration_label(&self) -> String {
        self.duration
            .map(format_clock)
            .unwrap_or_else(|| "--:--".to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistView {
    pub tracks: Vec<TrackInfo>,
    pub current_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerStatus {
    pub is_playing: bool,
    pub is_paused: bool,
    pub current_track: Option<TrackInfo>,
    pub position: f64,
    pub duration: f64,
    pub volume: u8,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_paused: false,
            current_track: None,
            position: 0.0,
            duration: 0.0,
            volume: 80,
        }
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub fn track_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name(path))
}

pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_info_derives_title_and_filename() {
        let track = TrackInfo::new(
            2,
            Path::new("uploads/Night Drive.mp3"),
            Some(Duration::from_millis(185_400)),
        );
        assert_eq!(track.id, 2);
        assert_eq!(track.title, "Night Drive");
        assert_eq!(track.filename, "Night Drive.mp3");
        assert_eq!(track.path, "uploads/Night Drive.mp3");
        assert_eq!(track.duration_label(), "3:05");
    }

    #[test]
    fn unknown_duration_renders_placeholder() {
        let track = TrackInfo::new(0, Path::new("a.wav"), None);
        assert_eq!(track.duration, None);
        assert_eq!(track.duration_label(), "--:--");
    }

    #[test]
    fn clock_clamps_invalid_values() {
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(61.4), "1:01");
    }
}
