//! YouTube Transcript Server - a small HTTP service for YouTube captions
//!
//! This library fetches caption tracks for a YouTube video, retrying through a proxied
//! and a direct route with rotating language preferences, and serves the result as a
//! JSON array or as timestamped plain text.

pub mod cli;
pub mod config;
pub mod output;
pub mod server;
pub mod sources;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use sources::{TranscriptSource, youtube::YoutubeSource};
pub use transcript::{Transcript, TranscriptEntry, retry::{RetryOrchestrator, RetryPolicy}};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Substrings that mark an otherwise unclassified failure as a probable IP block
///
/// Plain substring checks, so `"ip"` also matches words like "membership" or "skipped".
const IP_BLOCK_MARKERS: &[&str] = &["ip", "blocked", "too many requests", "429"];

/// Errors raised while fetching a transcript
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript found for video {video_id} in {requested:?} (available: {available:?})")]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("Video {video_id} is unplayable: {reason}")]
    VideoUnplayable { video_id: String, reason: String },

    #[error("Video {0} is age restricted")]
    AgeRestricted(String),

    #[error("YouTube is blocking requests from this IP")]
    IpBlocked,

    #[error("YouTube blocked the request: {0}")]
    RequestBlocked(String),

    #[error("YouTube request failed: {0}")]
    RequestFailed(String),

    #[error("Could not parse YouTube response: {0}")]
    Unparsable(String),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// True when the error says, or merely suggests, that YouTube is blocking this host.
    ///
    /// Typed block errors always qualify. Everything else is judged on its message, since
    /// transport failures from a blocked address rarely arrive with a useful type.
    pub fn is_probable_ip_block(&self) -> bool {
        let detail = match self {
            FetchError::IpBlocked | FetchError::RequestBlocked(_) => return true,
            FetchError::InvalidVideoId(_)
            | FetchError::TranscriptsDisabled(_)
            | FetchError::NoTranscriptFound { .. }
            | FetchError::VideoUnavailable(_)
            | FetchError::AgeRestricted(_) => return false,
            // Only the reason, the video id could match a marker by accident
            FetchError::VideoUnplayable { reason, .. } => reason.to_lowercase(),
            other => other.to_string().to_lowercase(),
        };

        IP_BLOCK_MARKERS.iter().any(|marker| detail.contains(marker))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the video id, which must not leak into message heuristics
        FetchError::Http(err.without_url())
    }
}
