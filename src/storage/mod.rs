pub mod config;
pub mod media_dirs;
