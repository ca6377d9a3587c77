use std::path::PathBuf;

use thiserror::Error;

/// Failures a front end can surface to the user.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("Invalid track index {index} (playlist has {len} tracks)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Track not found: {0}")]
    TrackNotFound(usize),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("player session has shut down")]
    SessionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
