use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::domain::commands::SlashCommand;
use crate::domain::errors::PlayerError;
use crate::domain::models::{file_name, track_title, PlayerStatus, PlaylistView, TrackInfo};
use crate::domain::palette::{fuzzy_filter, player_palette, PaletteItem};
use crate::integrations::downloader::{validate_url, AudioDownloader, YtDlpDownloader};
use crate::integrations::media_probe::LoftyProbe;
use crate::integrations::playback::{engine_from_config, PlaybackState};
use crate::session::{PlayerSession, SessionHandle};
use crate::storage::config::RuntimeConfig;
use crate::storage::media_dirs::{has_allowed_extension, MediaDirs};
use crate::ui::Tui;

const REFRESH_INTERVAL: Duration = Duration::from_millis(500);
const VOLUME_STEP: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Playlist,
    Slash,
    Palette,
}

impl Focus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Playlist => "Playlist",
            Self::Slash => "Slash",
            Self::Palette => "Palette",
        }
    }
}

#[derive(Debug)]
struct DownloadOutcome {
    url: String,
    result: std::result::Result<TrackInfo, String>,
}

pub struct App {
    pub running: bool,
    pub status_message: String,
    pub selected_index: usize,
    pub focus: Focus,
    pub slash_input: String,
    pub palette_input: String,
    focus_before_palette: Focus,
    palette_selected_index: usize,
    view: PlaylistView,
    status: PlayerStatus,
    last_refresh: Option<Instant>,
    session: SessionHandle,
    downloader: Arc<dyn AudioDownloader>,
    downloads_dir: PathBuf,
    download_tx: Sender<DownloadOutcome>,
    download_rx: Receiver<DownloadOutcome>,
    pending_downloads: usize,
}

impl App {
    pub fn new(
        session: SessionHandle,
        downloader: Arc<dyn AudioDownloader>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let (download_tx, download_rx) = mpsc::channel();
        let mut app = Self {
            running: true,
            status_message: "Ready".to_string(),
            selected_index: 0,
            focus: Focus::Playlist,
            slash_input: String::new(),
            palette_input: String::new(),
            focus_before_palette: Focus::Playlist,
            palette_selected_index: 0,
            view: PlaylistView::default(),
            status: PlayerStatus::default(),
            last_refresh: None,
            session,
            downloader,
            downloads_dir: downloads_dir.into(),
            download_tx,
            download_rx,
            pending_downloads: 0,
        };
        app.refresh().context("read player state on startup")?;
        Ok(app)
    }

    pub fn tracks(&self) -> &[TrackInfo] {
        &self.view.tracks
    }

    pub fn current_index(&self) -> Option<usize> {
        self.view.current_index
    }

    pub fn selected_track(&self) -> Option<&TrackInfo> {
        self.view.tracks.get(self.selected_index)
    }

    pub fn player_status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn now_playing(&self) -> Option<&TrackInfo> {
        self.status.current_track.as_ref()
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.status.is_playing {
            PlaybackState::Playing
        } else if self.status.is_paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn pending_downloads(&self) -> usize {
        self.pending_downloads
    }

    pub fn current_input(&self) -> String {
        match self.focus {
            Focus::Playlist => String::new(),
            Focus::Slash => self.slash_input.clone(),
            Focus::Palette => self.palette_input.clone(),
        }
    }

    pub fn palette_selected_index(&self) -> usize {
        self.palette_selected_index
    }

    pub fn palette_preview(&self, limit: usize) -> Vec<PaletteItem> {
        let mut results = self.palette_results();
        results.truncate(limit);
        results
    }

    /// Collects finished downloads and refreshes player state when it is stale.
    pub fn tick(&mut self) -> Result<()> {
        self.poll_downloads();
        let stale = self
            .last_refresh
            .map(|at| at.elapsed() >= REFRESH_INTERVAL)
            .unwrap_or(true);
        if stale {
            self.refresh()?;
        }
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<()> {
        let (view, status) = self
            .session
            .blocking_request(|s| Ok((s.playlist_view(), s.status())))?;
        self.view = view;
        self.status = status;
        self.last_refresh = Some(Instant::now());
        self.clamp_selected_index();
        Ok(())
    }

    /// Returns how many finished downloads were collected.
    pub fn poll_downloads(&mut self) -> usize {
        let mut collected = 0;
        while let Ok(outcome) = self.download_rx.try_recv() {
            collected += 1;
            self.pending_downloads = self.pending_downloads.saturating_sub(1);
            self.status_message = match outcome.result {
                Ok(track) => format!("Downloaded {}", track.title),
                Err(err) => format!("Download failed ({}): {err}", outcome.url),
            };
        }
        if collected > 0 {
            self.last_refresh = None;
        }
        collected
    }

    pub fn toggle_focus(&mut self) {
        let next_focus = match self.focus {
            Focus::Playlist => Focus::Slash,
            Focus::Slash => Focus::Palette,
            Focus::Palette => Focus::Playlist,
        };
        self.set_focus(next_focus);
    }

    pub fn toggle_focus_backward(&mut self) {
        let prev_focus = match self.focus {
            Focus::Playlist => Focus::Palette,
            Focus::Slash => Focus::Playlist,
            Focus::Palette => Focus::Slash,
        };
        self.set_focus(prev_focus);
    }

    pub fn toggle_palette(&mut self) {
        if self.focus == Focus::Palette {
            self.focus = self.focus_before_palette;
            self.status_message = format!("Focus: {}", self.focus.label());
        } else {
            self.focus_before_palette = self.focus;
            self.focus = Focus::Palette;
            self.palette_selected_index = 0;
            self.status_message = "Focus: Palette".to_string();
        }
    }

    pub fn open_slash_input(&mut self) {
        if self.focus == Focus::Slash {
            self.slash_input.push('/');
            return;
        }
        self.focus = Focus::Slash;
        if self.slash_input.is_empty() {
            self.slash_input.push('/');
        }
    }

    pub fn close_overlays(&mut self) {
        match self.focus {
            Focus::Palette => {
                self.focus = self.focus_before_palette;
                self.palette_input.clear();
                self.palette_selected_index = 0;
                self.status_message = format!("Focus: {}", self.focus.label());
            }
            Focus::Slash => {
                self.slash_input.clear();
                self.focus = Focus::Playlist;
            }
            Focus::Playlist => {}
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Focus::Playlist => {}
            Focus::Slash => self.slash_input.push(c),
            Focus::Palette => {
                self.palette_input.push(c);
                self.palette_selected_index = 0;
            }
        }
    }

    pub fn backspace_input(&mut self) {
        match self.focus {
            Focus::Playlist => {}
            Focus::Slash => {
                self.slash_input.pop();
            }
            Focus::Palette => {
                self.palette_input.pop();
                self.palette_selected_index = 0;
            }
        }
    }

    pub fn submit_current_input(&mut self) -> Result<()> {
        match self.focus {
            Focus::Playlist => self.play_selected(),
            Focus::Slash => {
                let cmd = self.slash_input.clone();
                self.slash_input.clear();
                self.focus = Focus::Playlist;
                self.execute_slash(&cmd)
            }
            Focus::Palette => {
                let results = self.palette_results();
                let selected = results
                    .get(self.palette_selected_index)
                    .cloned()
                    .ok_or_else(|| anyhow!("no command matched palette input"))?;
                self.focus = self.focus_before_palette;
                self.palette_input.clear();
                self.palette_selected_index = 0;
                self.execute_palette_action(&selected.action)
            }
        }
    }

    pub fn select_next(&mut self) {
        if self.focus == Focus::Palette {
            let len = self.palette_results().len();
            if len == 0 {
                return;
            }
            self.palette_selected_index = (self.palette_selected_index + 1) % len;
            return;
        }

        let len = self.view.tracks.len();
        if len == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % len;
    }

    pub fn select_previous(&mut self) {
        if self.focus == Focus::Palette {
            let len = self.palette_results().len();
            if len == 0 {
                return;
            }
            if self.palette_selected_index == 0 {
                self.palette_selected_index = len - 1;
            } else {
                self.palette_selected_index -= 1;
            }
            return;
        }

        let len = self.view.tracks.len();
        if len == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = len - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    pub fn play_selected(&mut self) -> Result<()> {
        if self.view.tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist.into());
        }
        self.execute_command(SlashCommand::Play(Some(self.selected_index)))
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        let result = self.session.blocking_request(|s| {
            s.toggle_play_pause()?;
            Ok(s.playback_state())
        });
        self.report(
            "Play/pause",
            result.map(|state| format!("Playback {}", state.label().to_lowercase())),
        );
        self.refresh()
    }

    pub fn stop_playback(&mut self) -> Result<()> {
        self.execute_command(SlashCommand::Stop)
    }

    pub fn next_track(&mut self) -> Result<()> {
        self.execute_command(SlashCommand::Next)
    }

    pub fn previous_track(&mut self) -> Result<()> {
        self.execute_command(SlashCommand::Previous)
    }

    pub fn volume_up(&mut self) -> Result<()> {
        let target = i64::from(self.status.volume) + VOLUME_STEP;
        self.execute_command(SlashCommand::Volume(target))
    }

    pub fn volume_down(&mut self) -> Result<()> {
        let target = i64::from(self.status.volume) - VOLUME_STEP;
        self.execute_command(SlashCommand::Volume(target))
    }

    pub fn remove_selected(&mut self) -> Result<()> {
        if self.view.tracks.is_empty() {
            return Err(anyhow!("no track selected"));
        }
        self.execute_command(SlashCommand::Remove(self.selected_index))
    }

    pub fn request_quit(&mut self) -> Result<()> {
        self.execute_command(SlashCommand::Quit)
    }

    /// Adds files, or the audio files inside directories, to the playlist.
    pub fn add_paths(&mut self, inputs: &[PathBuf]) -> Result<usize> {
        let mut paths = Vec::new();
        for input in inputs {
            if input.is_dir() {
                paths.extend(audio_files_in(input)?);
            } else {
                paths.push(input.clone());
            }
        }
        let requested = paths.len();
        let added = self.session.blocking_request(move |s| Ok(s.add(paths)))?;
        self.status_message = if added == 0 {
            "Nothing added (missing files or already listed)".to_string()
        } else if added < requested {
            format!("Added {added} of {requested} tracks")
        } else {
            format!("Added {added} track(s)")
        };
        self.refresh()?;
        Ok(added)
    }

    fn clamp_selected_index(&mut self) {
        let len = self.view.tracks.len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    fn execute_slash(&mut self, input: &str) -> Result<()> {
        let command = SlashCommand::parse(input)?;
        self.execute_command(command)
    }

    fn execute_palette_action(&mut self, action: &str) -> Result<()> {
        if let Some(index) = action.strip_prefix("play:") {
            let index = index
                .parse::<usize>()
                .map_err(|_| anyhow!("unsupported palette action: {action}"))?;
            self.selected_index = index;
            return self.execute_command(SlashCommand::Play(Some(index)));
        }

        match action {
            "toggle" => self.toggle_play_pause(),
            "stop" => self.stop_playback(),
            "next" => self.next_track(),
            "previous" => self.previous_track(),
            "volume-up" => self.volume_up(),
            "volume-down" => self.volume_down(),
            "remove" => self.remove_selected(),
            "clear" => self.execute_command(SlashCommand::Clear),
            "help" => self.execute_command(SlashCommand::Help),
            "quit" => self.request_quit(),
            _ => Err(anyhow!("unsupported palette action: {action}")),
        }
    }

    fn execute_command(&mut self, command: SlashCommand) -> Result<()> {
        match command {
            SlashCommand::Add(path) => {
                self.add_paths(&[PathBuf::from(path)])?;
                return Ok(());
            }
            SlashCommand::Play(index) => {
                let result = self.session.blocking_request(move |s| {
                    s.play(index)?;
                    Ok(s.current_track().map(Path::to_path_buf))
                });
                self.report(
                    "Playback play",
                    result.map(|path| match path {
                        Some(path) => format!("Playing {}", track_title(&path)),
                        None => "Playing".to_string(),
                    }),
                );
            }
            SlashCommand::Pause => {
                let result = self.session.blocking_request(|s| s.pause());
                self.report("Playback pause", result.map(|_| "Playback paused".to_string()));
            }
            SlashCommand::Stop => {
                let result = self.session.blocking_request(|s| s.stop());
                self.report("Playback stop", result.map(|_| "Playback stopped".to_string()));
            }
            SlashCommand::Next => {
                let result = self.session.blocking_request(|s| s.next());
                self.report("Next track", result.map(|_| "Next track".to_string()));
            }
            SlashCommand::Previous => {
                let result = self.session.blocking_request(|s| s.previous());
                self.report("Previous track", result.map(|_| "Previous track".to_string()));
            }
            SlashCommand::Volume(value) => {
                let result = self.session.blocking_request(move |s| s.set_volume(value));
                self.report("Volume", result.map(|volume| format!("Volume {volume}")));
            }
            SlashCommand::Remove(index) => {
                let result = self.session.blocking_request(move |s| s.remove(index));
                self.report(
                    "Remove",
                    result.map(|path| format!("Removed {}", file_name(&path))),
                );
            }
            SlashCommand::Clear => {
                let result = self.session.blocking_request(|s| s.clear());
                self.report("Clear", result.map(|_| "Playlist cleared".to_string()));
            }
            SlashCommand::Download(url) => {
                let url = validate_url(&url)?.to_string();
                self.start_download(url);
            }
            SlashCommand::Quit => {
                self.session.shutdown();
                self.running = false;
                self.status_message = "Bye".to_string();
                return Ok(());
            }
            SlashCommand::Help => {
                self.status_message = "Commands: /add /play [n] /pause /stop /next /prev /volume n /remove n /clear /download url /quit".to_string();
                return Ok(());
            }
        }

        self.refresh()
    }

    fn start_download(&mut self, url: String) {
        let downloader = self.downloader.clone();
        let session = self.session.clone();
        let output_dir = self.downloads_dir.clone();
        let tx = self.download_tx.clone();
        let task_url = url.clone();

        let spawned = thread::Builder::new()
            .name("download".to_string())
            .spawn(move || {
                let result = match downloader.download(&task_url, &output_dir) {
                    Ok(path) => session
                        .blocking_request(move |s| s.add_track(path))
                        .map_err(|err| err.to_string()),
                    Err(err) => Err(format!("{err:#}")),
                };
                if let Err(err) = &result {
                    warn!(url = %task_url, error = %err, "download failed");
                }
                let _ = tx.send(DownloadOutcome {
                    url: task_url,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                self.pending_downloads += 1;
                info!(%url, "download started");
                self.status_message = format!("Download started: {url}");
            }
            Err(err) => {
                self.status_message = format!("Download failed to start: {err}");
            }
        }
    }

    fn report(&mut self, action: &str, result: std::result::Result<String, PlayerError>) {
        self.status_message = match result {
            Ok(message) => message,
            Err(err) => format!("{action} failed: {err}"),
        };
    }

    fn palette_results(&self) -> Vec<PaletteItem> {
        let titles: Vec<String> = self.view.tracks.iter().map(|t| t.title.clone()).collect();
        fuzzy_filter(&player_palette(&titles), &self.palette_input)
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        if self.focus != Focus::Palette {
            self.focus_before_palette = self.focus;
        }
        self.status_message = format!("Focus: {}", self.focus.label());
    }
}

fn audio_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(has_allowed_extension)
                    .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

pub fn run(config: RuntimeConfig, initial_files: Vec<PathBuf>) -> Result<()> {
    let playback = config.playback.clone();
    let (session, worker) = SessionHandle::spawn(move || {
        let engine = engine_from_config(&playback)?;
        Ok(PlayerSession::new(
            engine,
            Box::new(LoftyProbe),
            playback.initial_volume,
        )?)
    })?;

    let dirs = MediaDirs::from_config(&config.storage);
    dirs.ensure()?;
    let downloader: Arc<dyn AudioDownloader> =
        Arc::new(YtDlpDownloader::from_config(&config.download));

    let mut app = App::new(session.clone(), downloader, dirs.downloads())?;
    if !initial_files.is_empty() {
        app.add_paths(&initial_files)?;
    }

    let result = match Tui::new() {
        Ok(mut tui) => tui.run(&mut app),
        Err(err) => Err(err),
    };
    if let Err(err) = &result {
        warn!(error = ?err, "tui exited with error");
    }

    session.shutdown();
    worker.join().context("shutdown playback on exit")?;
    result
}
