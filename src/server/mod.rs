pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::integrations::downloader::AudioDownloader;
use crate::session::SessionHandle;
use crate::storage::config::{RuntimeConfig, ServerConfig};
use crate::storage::media_dirs::MediaDirs;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub dirs: MediaDirs,
    pub downloader: Arc<dyn AudioDownloader>,
}

impl AppState {
    pub fn new(session: SessionHandle, dirs: MediaDirs, downloader: Arc<dyn AudioDownloader>) -> Self {
        Self {
            session,
            dirs,
            downloader,
        }
    }
}

pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let cors = cors_layer(&config.cors_origins)?;
    let uploads = ServeDir::new(state.dirs.uploads());
    let downloads = ServeDir::new(state.dirs.downloads());

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/playlist",
            get(handlers::get_playlist).delete(handlers::clear_playlist),
        )
        .route("/status", get(handlers::get_status))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/stop", post(handlers::stop))
        .route("/next", post(handlers::next_track))
        .route("/previous", post(handlers::previous_track))
        .route("/volume", post(handlers::set_volume))
        .route("/upload", post(handlers::upload))
        .route("/download", post(handlers::download))
        .route("/track/:track_id", delete(handlers::remove_track))
        .nest_service("/uploads", uploads)
        .nest_service("/downloads", downloads)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub async fn run(
    config: &RuntimeConfig,
    session: SessionHandle,
    downloader: Arc<dyn AudioDownloader>,
) -> Result<()> {
    let dirs = MediaDirs::from_config(&config.storage);
    dirs.ensure()?;

    let app = build_router(AppState::new(session, dirs, downloader), &config.server)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "music player API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("music player API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
