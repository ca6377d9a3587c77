use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::errors::{PlayerError, PlayerResult};
use crate::storage::config::StorageConfig;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mp3", "wav", "flac", "m4a"];

/// Folders holding uploaded and downloaded tracks.
#[derive(Debug, Clone)]
pub struct MediaDirs {
    uploads: PathBuf,
    downloads: PathBuf,
}

impl MediaDirs {
    pub fn new(uploads: impl AsRef<Path>, downloads: impl AsRef<Path>) -> Self {
        Self {
            uploads: uploads.as_ref().to_path_buf(),
            downloads: downloads.as_ref().to_path_buf(),
        }
    }

    /// Resolves relative folders against the working directory, so stored
    /// files are handed to VLC as absolute paths.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            absolute_or_given(&config.uploads_dir),
            absolute_or_given(&config.downloads_dir),
        )
    }

    pub fn uploads(&self) -> &Path {
        &self.uploads
    }

    pub fn downloads(&self) -> &Path {
        &self.downloads
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.uploads, &self.downloads] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create media directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Writes an uploaded file into the uploads folder. Only the final path
    /// component of `file_name` is kept.
    pub fn store_upload(&self, file_name: &str, bytes: &[u8]) -> PlayerResult<PathBuf> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| PlayerError::InvalidRequest(format!("Invalid file name: {file_name}")))?;
        if !has_allowed_extension(&name) {
            return Err(PlayerError::InvalidFileType(name));
        }

        fs::create_dir_all(&self.uploads)?;
        let path = self.uploads.join(&name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Removes a stored file; a file that is already gone is not an error.
    pub fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove media file: {}", path.display())),
        }
    }
}

pub fn has_allowed_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

fn absolute_or_given(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if last.is_empty() || last == "." || last == ".." || last.chars().any(|ch| ch.is_control()) {
        return None;
    }
    Some(last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_from_client_names() {
        assert_eq!(
            sanitize_file_name("../../etc/song.mp3").as_deref(),
            Some("song.mp3")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\track.flac").as_deref(),
            Some("track.flac")
        );
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), None);
    }

    #[test]
    fn configured_relative_dirs_become_absolute() {
        let dirs = MediaDirs::from_config(&StorageConfig::default());
        assert!(dirs.uploads().is_absolute());
        assert!(dirs.downloads().is_absolute());
        assert!(dirs.uploads().ends_with("uploads"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("Song.MP3"));
        assert!(has_allowed_extension("a.m4a"));
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("mp3"));
    }
}
