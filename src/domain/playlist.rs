use std::path::{Path, PathBuf};

use crate::domain::errors::{PlayerError, PlayerResult};

/// Ordered, duplicate-free list of track paths with a wrapping pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<PathBuf>,
    current: usize,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.get(index).map(PathBuf::as_path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.position_of(path).is_some()
    }

    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.tracks.iter().position(|track| track == path)
    }

    /// Appends `path` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, path: PathBuf) -> bool {
        if self.contains(&path) {
            return false;
        }
        self.tracks.push(path);
        true
    }

    pub fn current_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }

    pub fn current(&self) -> Option<&Path> {
        self.current_index().and_then(|index| self.get(index))
    }

    /// Looks up `index` with the same errors as [`select`](Self::select),
    /// without moving the pointer.
    pub fn checked(&self, index: usize) -> PlayerResult<&Path> {
        if self.tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }
        self.get(index).ok_or(PlayerError::InvalidIndex {
            index,
            len: self.tracks.len(),
        })
    }

    pub fn select(&mut self, index: usize) -> PlayerResult<&Path> {
        self.checked(index)?;
        self.current = index;
        Ok(&self.tracks[index])
    }

    /// Index after the pointer, wrapping at the end.
    pub fn next_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        (len > 0).then(|| (self.current + 1) % len)
    }

    /// Index before the pointer, wrapping to the last entry from 0.
    pub fn previous_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        (len > 0).then(|| if self.current == 0 { len - 1 } else { self.current - 1 })
    }

    /// Moves the pointer forward, wrapping at the end.
    pub fn advance(&mut self) -> Option<usize> {
        let index = self.next_index()?;
        self.current = index;
        Some(index)
    }

    /// Moves the pointer back, wrapping to the last entry from 0.
    pub fn rewind(&mut self) -> Option<usize> {
        let index = self.previous_index()?;
        self.current = index;
        Some(index)
    }

    /// Removes the entry at `index`. The pointer is only clamped when it falls
    /// past the new end; it is not shifted for removals before it.
    pub fn remove(&mut self, index: usize) -> PlayerResult<PathBuf> {
        if index >= self.tracks.len() {
            return Err(PlayerError::TrackNotFound(index));
        }
        let removed = self.tracks.remove(index);
        if self.current >= self.tracks.len() {
            self.current = self.tracks.len().saturating_sub(1);
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = 0;
    }
}
