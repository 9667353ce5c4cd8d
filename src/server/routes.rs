use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::output::format_as_text;
use crate::transcript::{Transcript, TranscriptEntry};
use crate::utils::extract_video_id;

/// Number of entries echoed back by `/test`
const TEST_SAMPLE_SIZE: usize = 3;

#[derive(Debug, Deserialize)]
pub struct TranscriptQuery {
    #[serde(default, rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub status: &'static str,
    pub video_id: String,
    pub entries: usize,
    pub sample: Vec<TranscriptEntry>,
}

/// Validate the `videoId` parameter and resolve URLs to bare ids
fn resolve_video_id(query: &TranscriptQuery) -> Result<String, ApiError> {
    let raw = match query.video_id.as_deref() {
        None | Some("") => return Err(ApiError::missing_video_id()),
        Some(raw) => raw,
    };

    if raw.trim().is_empty() {
        return Err(ApiError::empty_video_id());
    }

    extract_video_id(raw).ok_or_else(|| ApiError::invalid_video_id(raw))
}

async fn fetch(state: &AppState, video_id: &str) -> Result<Transcript, ApiError> {
    state
        .orchestrator
        .fetch(video_id)
        .await
        .map_err(|e| ApiError::from_fetch(video_id, e))
}

/// `GET /transcript?videoId=` - JSON array of `{start, duration, text}`
pub async fn transcript(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<Vec<TranscriptEntry>>, ApiError> {
    let video_id = resolve_video_id(&query)?;
    tracing::debug!("Fetching transcript for video ID: {}", video_id);

    let transcript = fetch(&state, &video_id).await?;
    tracing::debug!("Successfully retrieved transcript with {} entries", transcript.len());

    Ok(Json(transcript.entries))
}

/// `GET /transcript/formatted?videoId=` - plain text with `M:SS` timestamps
pub async fn formatted_transcript(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Response, ApiError> {
    let video_id = resolve_video_id(&query)?;
    tracing::debug!("Fetching formatted transcript for video ID: {}", video_id);

    let transcript = fetch(&state, &video_id).await?;
    tracing::debug!("Successfully formatted transcript with {} entries", transcript.len());

    let body = format_as_text(&transcript.entries);
    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response())
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "YouTube Transcript API is running",
    }))
}

/// `GET /test` - fetch the configured probe video end to end
pub async fn self_test(State(state): State<AppState>) -> Result<Json<TestResponse>, ApiError> {
    let video_id = state.test_video_id.clone();
    tracing::info!("Running transcript self-test with video ID: {}", video_id);

    let transcript = fetch(&state, &video_id).await?;
    let entries = transcript.len();
    let sample = transcript.entries.into_iter().take(TEST_SAMPLE_SIZE).collect();

    Ok(Json(TestResponse {
        status: "success",
        video_id,
        entries,
        sample,
    }))
}

/// `GET /` - API documentation
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "YouTube Transcript API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Fetch YouTube video transcripts using video ID",
        "endpoints": {
            "/transcript": {
                "method": "GET",
                "description": "Fetch transcript for a YouTube video (JSON format)",
                "parameters": { "videoId": "YouTube video ID or URL (required)" },
                "example": "/transcript?videoId=dQw4w9WgXcQ",
            },
            "/transcript/formatted": {
                "method": "GET",
                "description": "Fetch transcript for a YouTube video (formatted text with timestamps)",
                "parameters": { "videoId": "YouTube video ID or URL (required)" },
                "example": "/transcript/formatted?videoId=dQw4w9WgXcQ",
            },
            "/health": {
                "method": "GET",
                "description": "Health check endpoint",
            },
            "/test": {
                "method": "GET",
                "description": "Fetch a known video to check that YouTube is reachable",
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(value: Option<&str>) -> TranscriptQuery {
        TranscriptQuery {
            video_id: value.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_video_id() {
        assert_eq!(resolve_video_id(&query(Some("dQw4w9WgXcQ"))).unwrap(), "dQw4w9WgXcQ");
        assert_eq!(
            resolve_video_id(&query(Some("https://youtu.be/dQw4w9WgXcQ"))).unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_resolve_video_id_rejections() {
        let missing = resolve_video_id(&query(None)).unwrap_err();
        assert_eq!(missing.error, "Missing required parameter: videoId");

        let empty = resolve_video_id(&query(Some(""))).unwrap_err();
        assert_eq!(empty.error, "Missing required parameter: videoId");

        let blank = resolve_video_id(&query(Some("   "))).unwrap_err();
        assert_eq!(blank.message, "videoId cannot be empty");

        let junk = resolve_video_id(&query(Some("what is this?"))).unwrap_err();
        assert_eq!(junk.error, "Invalid videoId parameter");
    }
}
