use async_trait::async_trait;

pub mod captions;
pub mod youtube;

use crate::transcript::Transcript;
use crate::FetchError;

/// Trait for fetching a transcript over one network route
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for a video, preferring tracks in `languages` order
    ///
    /// An empty `languages` list accepts any available track.
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Transcript, FetchError>;

    /// Short name of the route, used in logs
    fn route_name(&self) -> &'static str;
}
