use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::domain::errors::PlayerError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Maps [`PlayerError`] onto HTTP status codes with a `{"detail": ..}` body.
#[derive(Debug)]
pub struct ApiError(pub PlayerError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(PlayerError::InvalidRequest(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PlayerError::EmptyPlaylist
            | PlayerError::InvalidIndex { .. }
            | PlayerError::FileNotFound(_)
            | PlayerError::InvalidFileType(_)
            | PlayerError::InvalidUrl(_)
            | PlayerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PlayerError::TrackNotFound(_) => StatusCode::NOT_FOUND,
            PlayerError::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
            PlayerError::Io(_) | PlayerError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            PlayerError::InvalidIndex { .. } => "Invalid track index".to_string(),
            PlayerError::TrackNotFound(_) => "Track not found".to_string(),
            PlayerError::InvalidFileType(_) => "Invalid file type".to_string(),
            PlayerError::Engine(err) => format!("{err:#}"),
            other => other.to_string(),
        }
    }
}

impl From<PlayerError> for ApiError {
    fn from(err: PlayerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!(%status, error = %detail, "request failed");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_codes() {
        assert_eq!(
            ApiError(PlayerError::EmptyPlaylist).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(PlayerError::InvalidIndex { index: 9, len: 2 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(PlayerError::TrackNotFound(3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(PlayerError::SessionClosed).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(PlayerError::Engine(anyhow::anyhow!("vlc died"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn details_match_client_messages() {
        assert_eq!(
            ApiError(PlayerError::EmptyPlaylist).detail(),
            "Playlist is empty"
        );
        assert_eq!(
            ApiError(PlayerError::InvalidFileType("a.txt".to_string())).detail(),
            "Invalid file type"
        );
    }
}
