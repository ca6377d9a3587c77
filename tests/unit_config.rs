use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use musicbox::storage::config::{PlaybackMode, RuntimeConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn load_config_file_applies_defaults() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
            [playback]
            mode = "http"
            http_password = "secret"

            [server]
            port = 9100

            [download]
            audio_format = "flac"
        "#,
    )
    .expect("write config");

    let previous = snapshot_env();
    clear_tracked_env();
    let config = RuntimeConfig::load_from_path(&config_path).expect("load config from path");
    restore_env(&previous);

    assert_eq!(config.playback.mode, PlaybackMode::Http);
    assert_eq!(config.playback.http_password, "secret");
    assert_eq!(config.playback.vlc_program, "cvlc");
    assert_eq!(config.playback.initial_volume, 80);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.storage.uploads_dir, PathBuf::from("uploads"));
    assert_eq!(config.download.audio_format, "flac");
    assert_eq!(config.download.program, "yt-dlp");
}

#[test]
fn missing_file_yields_defaults() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");

    let previous = snapshot_env();
    clear_tracked_env();
    let config = RuntimeConfig::load_from_path(&dir.path().join("absent.toml"))
        .expect("load default config");
    restore_env(&previous);

    assert_eq!(config, RuntimeConfig::default());
    assert_eq!(config.playback.mode, PlaybackMode::Process);
    assert_eq!(config.server.port, 8000);
}

#[test]
fn env_vars_override_file_values() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
            [playback]
            mode = "process"
            initial_volume = 40

            [server]
            host = "127.0.0.1"
            port = 8000

            [storage]
            downloads_dir = "file-downloads"
        "#,
    )
    .expect("write config");

    let previous = snapshot_env();
    clear_tracked_env();
    env::set_var("MUSICBOX_PLAYBACK_MODE", "http");
    env::set_var("MUSICBOX_VOLUME", "65");
    env::set_var("MUSICBOX_PORT", "9999");
    env::set_var("MUSICBOX_DOWNLOADS_DIR", "/srv/music/downloads");
    env::set_var("MUSICBOX_DOWNLOAD_TIMEOUT_SECS", "30");

    let config = RuntimeConfig::load_from_path(&config_path);
    restore_env(&previous);
    let config = config.expect("load config from path");

    assert_eq!(config.playback.mode, PlaybackMode::Http);
    assert_eq!(config.playback.initial_volume, 65);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9999);
    assert_eq!(
        config.storage.downloads_dir,
        PathBuf::from("/srv/music/downloads")
    );
    assert_eq!(config.download.timeout_secs, 30);
}

#[test]
fn invalid_env_value_is_reported() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");

    let previous = snapshot_env();
    clear_tracked_env();
    env::set_var("MUSICBOX_PORT", "not-a-port");
    let result = RuntimeConfig::load_from_path(&dir.path().join("absent.toml"));
    restore_env(&previous);

    let err = result.expect_err("bad port should fail");
    assert!(format!("{err:#}").contains("MUSICBOX_PORT"));
}

#[test]
fn out_of_range_volume_fails_validation() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[playback]\ninitial_volume = 120\n").expect("write config");

    let previous = snapshot_env();
    clear_tracked_env();
    let result = RuntimeConfig::load_from_path(&config_path);
    restore_env(&previous);

    let err = result.expect_err("volume above 100 should fail");
    assert!(err.to_string().contains("initial_volume"));
}

fn snapshot_env() -> Vec<(&'static str, Option<String>)> {
    tracked_env_keys()
        .into_iter()
        .map(|key| (key, env::var(key).ok()))
        .collect()
}

fn clear_tracked_env() {
    for key in tracked_env_keys() {
        env::remove_var(key);
    }
}

fn restore_env(previous: &[(&str, Option<String>)]) {
    for (key, value) in previous {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}

fn tracked_env_keys() -> [&'static str; 11] {
    [
        "MUSICBOX_PLAYBACK_MODE",
        "MUSICBOX_VLC_PROGRAM",
        "MUSICBOX_VLC_HTTP_URL",
        "MUSICBOX_VLC_HTTP_PASSWORD",
        "MUSICBOX_VOLUME",
        "MUSICBOX_HOST",
        "MUSICBOX_PORT",
        "MUSICBOX_UPLOADS_DIR",
        "MUSICBOX_DOWNLOADS_DIR",
        "MUSICBOX_YTDLP_PROGRAM",
        "MUSICBOX_DOWNLOAD_TIMEOUT_SECS",
    ]
}
