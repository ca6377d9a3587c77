pub mod app;
pub mod domain;
pub mod integrations;
pub mod server;
pub mod session;
pub mod storage;
pub mod ui;
