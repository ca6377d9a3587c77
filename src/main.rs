use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use musicbox::integrations::downloader::{AudioDownloader, YtDlpDownloader};
use musicbox::integrations::media_probe::LoftyProbe;
use musicbox::integrations::playback::engine_from_config;
use musicbox::session::{PlayerSession, SessionHandle};
use musicbox::storage::config::RuntimeConfig;
use musicbox::{app, server};

#[derive(Debug, Parser)]
#[command(name = "musicbox", version, about = "VLC-backed music player with a terminal UI and REST API")]
struct Cli {
    #[arg(long, env = "MUSICBOX_CONFIG", help = "Path to config.toml")]
    config: Option<PathBuf>,
    #[arg(long, help = "Enable verbose debug logs")]
    debug: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal player (default)
    Tui {
        /// Files or directories to queue on startup
        files: Vec<PathBuf>,
    },
    /// REST API server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_path(path),
        None => RuntimeConfig::load(),
    }
    .context("load runtime config")?;

    match cli.command.unwrap_or(Command::Tui { files: Vec::new() }) {
        Command::Tui { files } => {
            init_file_tracing(cli.debug)?;
            app::run(config, files)
        }
        Command::Serve { host, port } => {
            init_tracing(cli.debug);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config)
        }
    }
}

fn serve(config: RuntimeConfig) -> Result<()> {
    let playback = config.playback.clone();
    let (session, worker) = SessionHandle::spawn(move || {
        let engine = engine_from_config(&playback)?;
        Ok(PlayerSession::new(
            engine,
            Box::new(LoftyProbe),
            playback.initial_volume,
        )?)
    })?;
    let downloader: Arc<dyn AudioDownloader> =
        Arc::new(YtDlpDownloader::from_config(&config.download));

    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    let result = runtime.block_on(server::run(&config, session.clone(), downloader));

    session.shutdown();
    worker.join().context("shutdown playback on exit")?;
    result
}

fn env_filter(debug: bool) -> tracing_subscriber::EnvFilter {
    let default = if debug { "musicbox=debug" } else { "musicbox=info" };
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

fn init_tracing(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(std::io::stderr)
        .try_init();
}

/// The terminal owns stdout and stderr while the TUI runs, so logs go to a file.
fn init_file_tracing(debug: bool) -> Result<()> {
    let dir = RuntimeConfig::config_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config dir: {}", dir.display()))?;
    let path = dir.join("musicbox.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file: {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
