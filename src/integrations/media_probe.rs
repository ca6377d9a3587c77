use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use lofty::file::AudioFile;
use tracing::warn;

pub trait MediaProbe: Send {
    /// Length of the media at `path`, or `None` when it cannot be determined.
    fn duration(&self, path: &Path) -> Result<Option<Duration>>;
}

/// Reads durations from audio properties via lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyProbe;

impl MediaProbe for LoftyProbe {
    fn duration(&self, path: &Path) -> Result<Option<Duration>> {
        let tagged = lofty::read_from_path(path)
            .with_context(|| format!("failed to read audio properties: {}", path.display()))?;
        let duration = tagged.properties().duration();
        Ok((!duration.is_zero()).then_some(duration))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn read(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Durations keyed by path. An entry is re-probed when the file's size or
/// modification time changes.
pub struct DurationCache {
    probe: Box<dyn MediaProbe>,
    entries: HashMap<PathBuf, (Fingerprint, Option<Duration>)>,
}

impl DurationCache {
    pub fn new(probe: Box<dyn MediaProbe>) -> Self {
        Self {
            probe,
            entries: HashMap::new(),
        }
    }

    pub fn duration(&mut self, path: &Path) -> Option<Duration> {
        let fingerprint = Fingerprint::read(path)?;
        if let Some((cached, duration)) = self.entries.get(path) {
            if *cached == fingerprint {
                return *duration;
            }
        }

        let duration = match self.probe.duration(path) {
            Ok(duration) => duration,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not determine track duration");
                None
            }
        };
        self.entries
            .insert(path.to_path_buf(), (fingerprint, duration));
        duration
    }

    pub fn forget(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingProbe {
        calls: Arc<AtomicUsize>,
    }

    impl MediaProbe for CountingProbe {
        fn duration(&self, path: &Path) -> Result<Option<Duration>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let len = fs::metadata(path)?.len();
            Ok(Some(Duration::from_secs(len)))
        }
    }

    #[test]
    fn cached_duration_is_reused_until_file_changes() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("song.mp3");
        fs::write(&path, b"abc").expect("write track");

        let calls = Arc::new(AtomicUsize::new(0));
        let mut cache = DurationCache::new(Box::new(CountingProbe {
            calls: calls.clone(),
        }));

        assert_eq!(cache.duration(&path), Some(Duration::from_secs(3)));
        assert_eq!(cache.duration(&path), Some(Duration::from_secs(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        fs::write(&path, b"abcdefg").expect("rewrite track");
        assert_eq!(cache.duration(&path), Some(Duration::from_secs(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_file_has_no_duration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut cache = DurationCache::new(Box::new(CountingProbe {
            calls: calls.clone(),
        }));
        assert_eq!(cache.duration(Path::new("/definitely/missing.mp3")), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn lofty_probe_failure_is_cached_as_unknown() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("not-audio.mp3");
        fs::write(&path, b"plain text, not audio").expect("write file");

        let mut cache = DurationCache::new(Box::new(LoftyProbe));
        assert_eq!(cache.duration(&path), None);
        assert_eq!(cache.len(), 1);

        cache.forget(&path);
        assert!(cache.is_empty());
    }
}
