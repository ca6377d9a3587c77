use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::error::ApiError;
use super::AppState;
use crate::domain::errors::PlayerError;
use crate::domain::models::{file_name, PlayerStatus, PlaylistView, TrackInfo};
use crate::integrations::downloader::validate_url;
use crate::storage::media_dirs::has_allowed_extension;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayParams {
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: i64,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    message: String,
    volume: u8,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    url: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    message: String,
    url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    message: String,
    track: TrackInfo,
}

pub async fn root() -> Json<MessageResponse> {
    MessageResponse::new("Music Player API is running")
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "musicbox".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_playlist(State(state): State<AppState>) -> ApiResult<PlaylistView> {
    let view = state.session.request(|s| Ok(s.playlist_view())).await?;
    Ok(Json(view))
}

pub async fn get_status(State(state): State<AppState>) -> ApiResult<PlayerStatus> {
    let status = state.session.request(|s| Ok(s.status())).await?;
    Ok(Json(status))
}

/// POST /play?index=N plays track N; without an index resumes the current track.
pub async fn play(
    State(state): State<AppState>,
    params: Result<Query<PlayParams>, QueryRejection>,
) -> ApiResult<MessageResponse> {
    let Query(params) = params.map_err(|rej| ApiError::bad_request(rej.body_text()))?;
    state.session.request(move |s| s.play(params.index)).await?;
    Ok(MessageResponse::new("Playing"))
}

pub async fn pause(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state.session.request(|s| s.pause()).await?;
    Ok(MessageResponse::new("Paused"))
}

pub async fn stop(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state.session.request(|s| s.stop()).await?;
    Ok(MessageResponse::new("Stopped"))
}

pub async fn next_track(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state.session.request(|s| s.next()).await?;
    Ok(MessageResponse::new("Next track"))
}

pub async fn previous_track(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state.session.request(|s| s.previous()).await?;
    Ok(MessageResponse::new("Previous track"))
}

pub async fn set_volume(
    State(state): State<AppState>,
    payload: Result<Json<VolumeRequest>, JsonRejection>,
) -> ApiResult<VolumeResponse> {
    let Json(request) = payload.map_err(|rej| ApiError::bad_request(rej.body_text()))?;
    let volume = state
        .session
        .request(move |s| s.set_volume(request.volume))
        .await?;
    Ok(Json(VolumeResponse {
        message: format!("Volume set to {volume}"),
        volume,
    }))
}

/// POST /upload stores the multipart `file` field and appends it to the playlist.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let client_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Missing file name"))?;
        if !has_allowed_extension(&client_name) {
            return Err(PlayerError::InvalidFileType(client_name).into());
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(err.body_text()))?;

        let dirs = state.dirs.clone();
        let path = tokio::task::spawn_blocking(move || dirs.store_upload(&client_name, &bytes))
            .await
            .map_err(|err| PlayerError::Engine(anyhow::anyhow!("upload task failed: {err}")))??;

        let stored = path.clone();
        return match state.session.request(move |s| s.add_track(stored)).await {
            Ok(track) => {
                info!(path = %path.display(), "upload added to playlist");
                Ok(Json(UploadResponse {
                    message: "File uploaded successfully".to_string(),
                    track,
                }))
            }
            Err(err) => {
                if let Err(cleanup) = state.dirs.discard(&path) {
                    warn!(path = %path.display(), error = ?cleanup, "failed to clean up upload");
                }
                Err(err.into())
            }
        };
    }

    Err(ApiError::bad_request("Missing file field"))
}

/// POST /download validates the URL and fetches it in the background.
pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<DownloadResponse> {
    let Json(request) = payload.map_err(|rej| ApiError::bad_request(rej.body_text()))?;
    let url = validate_url(&request.url)?.to_string();
    spawn_download(state, url.clone());
    Ok(Json(DownloadResponse {
        message: "Download started".to_string(),
        url,
    }))
}

pub async fn clear_playlist(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    state.session.request(|s| s.clear()).await?;
    Ok(MessageResponse::new("Playlist cleared"))
}

pub async fn remove_track(
    State(state): State<AppState>,
    track_id: Result<Path<usize>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path(track_id) = track_id.map_err(|rej| ApiError::bad_request(rej.body_text()))?;
    let removed = state.session.request(move |s| s.remove(track_id)).await?;
    Ok(MessageResponse::new(format!(
        "Removed track: {}",
        file_name(&removed)
    )))
}

/// Download failures are logged and otherwise dropped; the client polls
/// `/playlist` to see finished downloads.
fn spawn_download(state: AppState, url: String) {
    tokio::spawn(async move {
        let downloader = state.downloader.clone();
        let output_dir = state.dirs.downloads().to_path_buf();
        let task_url = url.clone();
        let fetched =
            tokio::task::spawn_blocking(move || downloader.download(&task_url, &output_dir)).await;

        let path = match fetched {
            Ok(Ok(path)) => path,
            Ok(Err(err)) => {
                warn!(%url, error = ?err, "download failed");
                return;
            }
            Err(err) => {
                error!(%url, error = %err, "download task panicked");
                return;
            }
        };

        match state.session.request(move |s| s.add_track(path)).await {
            Ok(track) => info!(%url, title = %track.title, "downloaded track added"),
            Err(err) => warn!(%url, error = %err, "could not add downloaded track"),
        }
    });
}
