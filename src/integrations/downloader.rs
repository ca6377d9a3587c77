use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::domain::errors::{PlayerError, PlayerResult};
use crate::storage::config::DownloadConfig;

const WAIT_POLL: Duration = Duration::from_millis(100);

pub trait AudioDownloader: Send + Sync {
    /// Fetches `url` as an audio file under `output_dir` and returns its path.
    fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Shells out to `yt-dlp`, which hands transcoding to ffmpeg.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: String,
    audio_format: String,
    audio_quality: String,
    timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            audio_format: "mp3".to_string(),
            audio_quality: "192".to_string(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            program: config.program.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(&self, url: &str, output_dir: &Path) -> Vec<String> {
        let template = output_dir.join("%(title)s.%(ext)s");
        vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "--audio-quality".to_string(),
            format!("{}K", self.audio_quality),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-progress".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            url.to_string(),
        ]
    }
}

impl AudioDownloader for YtDlpDownloader {
    fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("failed to create download directory: {}", output_dir.display())
        })?;

        let args = self.args(url, output_dir);
        debug!(program = %self.program, ?args, "starting download");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    anyhow!(
                        "failed to start downloader: '{}' not found on PATH; install yt-dlp and ffmpeg",
                        self.program
                    )
                } else {
                    anyhow!("failed to start downloader '{}': {err}", self.program)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture downloader stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("failed to capture downloader stderr"))?;
        let stdout_reader = thread::spawn(move || read_all(stdout));
        let stderr_reader = thread::spawn(move || read_all(stderr));

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .context("failed waiting for downloader process")?
            {
                break status;
            }
            if Instant::now() >= deadline {
                child.kill().context("failed to kill stalled downloader")?;
                let _ = child.wait();
                return Err(anyhow!(
                    "download timed out after {}s: {url}",
                    self.timeout.as_secs()
                ));
            }
            thread::sleep(WAIT_POLL);
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        if !status.success() {
            return Err(anyhow!(
                "{} failed ({status}): {}",
                self.program,
                stderr.trim()
            ));
        }

        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("{} did not report a file path", self.program))?;
        if !path.exists() {
            return Err(anyhow!(
                "downloaded file is missing: {}",
                path.display()
            ));
        }

        info!(url, path = %path.display(), "download finished");
        Ok(path)
    }
}

fn read_all(mut source: impl Read) -> String {
    let mut buf = String::new();
    let _ = source.read_to_string(&mut buf);
    buf
}

/// Accepts absolute `http(s)` URLs with a host and without whitespace or
/// control characters.
pub fn validate_url(url: &str) -> PlayerResult<&str> {
    let trimmed = url.trim();
    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let host_present = trimmed
        .split_once("://")
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .map(|authority| !authority.is_empty())
        .unwrap_or(false);
    if !has_scheme
        || !host_present
        || trimmed
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
    {
        return Err(PlayerError::InvalidUrl(url.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_audio_extraction_arguments() {
        let downloader = YtDlpDownloader::new("yt-dlp");
        let args = downloader.args("https://example.com/watch?v=1", Path::new("downloads"));
        assert_eq!(args[0..2], ["-f", "bestaudio/best"]);
        assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
        assert!(args.windows(2).any(|w| w == ["--audio-quality", "192K"]));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args
            .windows(2)
            .any(|w| w[0] == "-o" && w[1].ends_with("%(title)s.%(ext)s")));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/watch?v=1"));
    }

    #[test]
    fn missing_binary_returns_actionable_error() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let downloader = YtDlpDownloader::new("definitely-not-yt-dlp");
        let err = downloader
            .download("https://example.com/a", dir.path())
            .expect_err("missing program should fail");
        assert!(err.to_string().contains("not found on PATH"));
    }

    #[test]
    fn url_validation() {
        assert_eq!(
            validate_url(" https://youtu.be/abc ").expect("valid url"),
            "https://youtu.be/abc"
        );
        assert!(validate_url("").is_err());
        assert!(validate_url("ftp://example.com/a.mp3").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("https:///").is_err());
        assert!(validate_url("https:///watch?v=1").is_err());
        assert!(validate_url("http://?q=1").is_err());
        assert!(validate_url("http://localhost:8080/a.mp3").is_ok());
        assert!(validate_url("https://example.com/a b").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn reports_printed_file_path() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let target = dir.path().join("Song.mp3");
        std::fs::write(&target, b"audio").expect("write target");
        let script = dir.path().join("fake-ytdlp.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho '{}'\n", target.display()),
        )
        .expect("write script");
        let mut perms = std::fs::metadata(&script).expect("stat").permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");

        let downloader = YtDlpDownloader::new(script.to_string_lossy().into_owned());
        let path = downloader
            .download("https://example.com/a", dir.path())
            .expect("fake download succeeds");
        assert_eq!(path, target);
    }

    #[cfg(unix)]
    #[test]
    fn stalled_download_times_out() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let script = dir.path().join("slow-ytdlp.sh");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 5\n").expect("write script");
        let mut perms = std::fs::metadata(&script).expect("stat").permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");

        let downloader = YtDlpDownloader::new(script.to_string_lossy().into_owned())
            .with_timeout(Duration::from_millis(200));
        let err = downloader
            .download("https://example.com/a", dir.path())
            .expect_err("should time out");
        assert!(err.to_string().contains("timed out"));
    }
}
