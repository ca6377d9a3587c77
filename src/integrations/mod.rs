pub mod downloader;
pub mod media_probe;
pub mod playback;
pub mod vlc_http;
pub mod vlc_process;
