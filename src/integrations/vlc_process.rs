use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use super::playback::{volume_percent_to_vlc_scale, PlaybackEngine, PlaybackState};

const SHUTDOWN_WAIT: Duration = Duration::from_millis(500);
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);
const REPLY_WAIT: Duration = Duration::from_millis(300);

/// Runs `cvlc` as a child process and drives it through the RC interface on
/// its stdin. Numeric replies (`get_time`, `get_length`, `is_playing`) are read
/// back from stdout by a reader thread.
pub struct VlcProcessEngine {
    program: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    replies: Option<Receiver<String>>,
    media: Option<PathBuf>,
    volume: Option<u8>,
    state: PlaybackState,
}

impl Default for VlcProcessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VlcProcessEngine {
    pub fn new() -> Self {
        Self::new_with_program("cvlc")
    }

    pub fn new_with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
            stdin: None,
            replies: None,
            media: None,
            volume: None,
            state: PlaybackState::Stopped,
        }
    }

    fn spawn_if_needed(&mut self) -> Result<()> {
        if self.child_is_running()? {
            return Ok(());
        }

        self.child = None;
        self.stdin = None;
        self.replies = None;

        let mut child = Command::new(&self.program)
            .args(["--intf", "rc", "--rc-fake-tty", "--no-video", "--quiet"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    anyhow!(
                        "failed to start VLC: '{}' not found on PATH; install VLC (e.g. apt install vlc)",
                        self.program
                    )
                } else {
                    anyhow!(
                        "failed to start VLC process '{} --intf rc --rc-fake-tty --no-video --quiet': {err}",
                        self.program
                    )
                }
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("failed to capture VLC stdin for RC commands"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture VLC stdout for RC replies"))?;

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("vlc-rc-reader".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .context("failed to start VLC reply reader")?;

        debug!(program = %self.program, pid = child.id(), "spawned VLC process");
        self.stdin = Some(stdin);
        self.replies = Some(rx);
        self.child = Some(child);

        if let Some(volume) = self.volume {
            self.send_command(&format!("volume {}", volume_percent_to_vlc_scale(volume)))?;
        }
        Ok(())
    }

    fn child_is_running(&mut self) -> Result<bool> {
        if let Some(child) = self.child.as_mut() {
            if child
                .try_wait()
                .context("failed checking VLC process status")?
                .is_none()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn send_command(&mut self, command: &str) -> Result<()> {
        if !self.child_is_running()? {
            return Err(anyhow!(
                "VLC process is not running; load a track to start playback"
            ));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("VLC command channel unavailable; load a track again"))?;

        stdin
            .write_all(format!("{command}\n").as_bytes())
            .with_context(|| {
                format!(
                    "failed writing command to VLC process ({command}); VLC may have exited unexpectedly"
                )
            })?;
        stdin
            .flush()
            .context("failed flushing VLC command stream; VLC may have exited unexpectedly")?;
        Ok(())
    }

    /// Sends `command` and waits briefly for the first numeric reply line.
    fn query_number(&mut self, command: &str) -> Result<Option<i64>> {
        if let Some(replies) = self.replies.as_ref() {
            while replies.try_recv().is_ok() {}
        }
        self.send_command(command)?;

        let replies = self
            .replies
            .as_ref()
            .ok_or_else(|| anyhow!("VLC reply channel unavailable"))?;
        let deadline = Instant::now() + REPLY_WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            match replies.recv_timeout(remaining) {
                Ok(line) => {
                    if let Some(value) = parse_reply(&line) {
                        return Ok(Some(value));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!("VLC output closed while waiting for '{command}'"))
                }
            }
        }
    }

    fn validate_media_path(path: &Path) -> Result<&str> {
        let text = path
            .to_str()
            .ok_or_else(|| anyhow!("media path is not valid UTF-8: {}", path.display()))?;
        if text.is_empty()
            || text.trim() != text
            || text.chars().any(|ch| ch.is_ascii_control())
        {
            return Err(anyhow!(
                "invalid media path characters detected; remove control characters and leading/trailing whitespace"
            ));
        }
        Ok(text)
    }
}

fn parse_reply(line: &str) -> Option<i64> {
    line.trim().trim_start_matches('>').trim().parse::<i64>().ok()
}

impl PlaybackEngine for VlcProcessEngine {
    fn load(&mut self, media: &Path) -> Result<()> {
        let validated = Self::validate_media_path(media)?.to_string();
        self.spawn_if_needed()?;
        self.send_command("clear")?;
        self.send_command(&format!("add {validated}"))?;
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
            // RC `pause` toggles, so it resumes from the paused state.
            PlaybackState::Paused => self.send_command("pause")?,
            PlaybackState::Stopped => {
                self.spawn_if_needed()?;
                self.send_command("play")?;
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
        self.send_command("pause")?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.state == PlaybackState::Stopped {
            return Err(anyhow!(
                "cannot stop because playback is already stopped"
            ));
        }
        self.send_command("stop")?;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn set_volume(&mut self, value: u8) -> Result<()> {
        self.volume = Some(value);
        if self.child_is_running()? {
            self.send_command(&format!("volume {}", volume_percent_to_vlc_scale(value)))?;
        }
        Ok(())
    }

    fn position(&mut self) -> Result<f64> {
        if self.media.is_none() || !self.child_is_running()? {
            return Ok(0.0);
        }

        if self.state == PlaybackState::Playing && self.query_number("is_playing")? == Some(0) {
            debug!("VLC reports end of media");
            self.state = PlaybackState::Stopped;
        }
        if self.state == PlaybackState::Stopped {
            return Ok(0.0);
        }

        let time = self.query_number("get_time")?.unwrap_or(0);
        let length = self.query_number("get_length")?.unwrap_or(0);
        if length <= 0 {
            return Ok(0.0);
        }
        Ok((time as f64 / length as f64).clamp(0.0, 1.0))
    }

    fn loaded_media(&self) -> Option<&Path> {
        self.media.as_deref()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.child.is_none() {
            self.state = PlaybackState::Stopped;
            return Ok(());
        }

        let _ = self.send_command("quit");
        let deadline = Instant::now() + SHUTDOWN_WAIT;
        if let Some(child) = self.child.as_mut() {
            loop {
                if child
                    .try_wait()
                    .context("failed waiting for VLC process exit")?
                    .is_some()
                {
                    break;
                }
                if Instant::now() >= deadline {
                    child.kill().context("failed to force-kill VLC process")?;
                    let _ = child.wait();
                    break;
                }
                thread::sleep(SHUTDOWN_POLL);
            }
        }

        self.stdin = None;
        self.replies = None;
        self.child = None;
        self.media = None;
        self.state = PlaybackState::Stopped;
        Ok(())
    }

    fn state(&self) -> PlaybackState {
        self.state
    }
}

impl Drop for VlcProcessEngine {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_vlc_binary_returns_actionable_error() {
        let mut engine = VlcProcessEngine::new_with_program("definitely-not-vlc-binary");
        let err = engine
            .load(Path::new("/music/song.mp3"))
            .expect_err("load should fail when VLC binary is missing");
        assert!(err.to_string().contains("not found on PATH"));
        assert!(engine.loaded_media().is_none());
    }

    #[test]
    fn shutdown_without_process_is_noop() {
        let mut engine = VlcProcessEngine::new_with_program("cvlc");
        engine.shutdown().expect("shutdown without process");
        assert_eq!(engine.state(), PlaybackState::Stopped);
    }

    #[test]
    fn play_without_media_is_rejected() {
        let mut engine = VlcProcessEngine::new_with_program("cvlc");
        let err = engine.play().expect_err("nothing loaded");
        assert!(err.to_string().contains("no media is loaded"));
    }

    #[test]
    fn volume_before_spawn_is_remembered() {
        let mut engine = VlcProcessEngine::new_with_program("definitely-not-vlc-binary");
        engine.set_volume(40).expect("volume without process");
        assert_eq!(engine.volume, Some(40));
        assert_eq!(engine.position().expect("position without media"), 0.0);
    }

    #[test]
    fn reject_media_path_with_control_characters() {
        let err = VlcProcessEngine::validate_media_path(Path::new("/music/a\nb.mp3"))
            .expect_err("newline should be rejected");
        assert!(err
            .to_string()
            .contains("invalid media path characters detected"));
    }

    #[test]
    fn reject_media_path_with_surrounding_whitespace() {
        let err = VlcProcessEngine::validate_media_path(Path::new(" /music/a.mp3 "))
            .expect_err("surrounding whitespace should be rejected");
        assert!(err
            .to_string()
            .contains("invalid media path characters detected"));
    }

    #[test]
    fn parses_numeric_replies_with_prompt() {
        assert_eq!(parse_reply("> 42"), Some(42));
        assert_eq!(parse_reply("187"), Some(187));
        assert_eq!(parse_reply("status change: ( play state: 3 )"), None);
    }
}
