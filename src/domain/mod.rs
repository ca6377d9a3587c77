pub mod commands;
pub mod errors;
pub mod models;
pub mod palette;
pub mod playlist;
