use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::FetchError;

const GENERIC_FAILURE: &str = "An unexpected error occurred while fetching the transcript";

/// Error answer of the HTTP API, rendered as `{"error": ..., "message": ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn missing_video_id() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Missing required parameter: videoId",
            "Please provide a YouTube video ID in the videoId query parameter",
        )
    }

    pub fn empty_video_id() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid videoId parameter", "videoId cannot be empty")
    }

    pub fn invalid_video_id(value: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Invalid videoId parameter",
            format!("'{}' is neither a YouTube video ID nor a YouTube URL", value),
        )
    }

    /// Map a fetch failure to its HTTP answer, logging it at the matching level
    pub fn from_fetch(video_id: &str, err: FetchError) -> Self {
        let api_error = match &err {
            FetchError::InvalidVideoId(value) => Self::invalid_video_id(value),
            FetchError::TranscriptsDisabled(_) => Self::new(
                StatusCode::NOT_FOUND,
                "Transcripts disabled",
                "Transcripts are disabled for this video",
            ),
            FetchError::NoTranscriptFound { .. } => Self::new(
                StatusCode::NOT_FOUND,
                "No transcript found",
                "No transcript is available for this video",
            ),
            FetchError::VideoUnavailable(_) => Self::new(
                StatusCode::NOT_FOUND,
                "Video unavailable",
                "The requested video is unavailable or does not exist",
            ),
            e if e.is_probable_ip_block() => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
                "YouTube is blocking requests from this server, please try again later",
            ),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", GENERIC_FAILURE),
        };

        if api_error.status.is_server_error() {
            tracing::error!("Fetching transcript for {} failed: {}", video_id, err);
        } else {
            tracing::warn!("Fetching transcript for {} failed: {}", video_id, err);
        }

        api_error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}
