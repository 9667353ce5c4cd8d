use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::Transcript;
use crate::config::Config;
use crate::sources::{youtube::YoutubeSource, TranscriptSource};
use crate::FetchError;

/// How many attempts to make and how long to wait between them
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per fetch
    pub max_attempts: u32,

    /// Lower bound of the randomized pause between attempts
    pub min_delay: Duration,

    /// Upper bound of the randomized pause between attempts
    pub max_delay: Duration,

    /// Language preference lists, picked by attempt index modulo their count
    pub language_sets: Vec<Vec<String>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(5),
            language_sets: default_language_sets(),
        }
    }
}

/// The five language preference lists used when none are configured
pub fn default_language_sets() -> Vec<Vec<String>> {
    [
        &["en"][..],
        &["en", "en-US", "en-GB"][..],
        &["en-US", "en"][..],
        &["en", "es", "fr", "de", "pt"][..],
        &[][..],
    ]
    .iter()
    .map(|set| set.iter().map(|code| code.to_string()).collect())
    .collect()
}

impl RetryPolicy {
    /// Languages to request on a given zero-based attempt
    pub fn languages_for(&self, attempt: u32) -> &[String] {
        if self.language_sets.is_empty() {
            return &[];
        }
        &self.language_sets[attempt as usize % self.language_sets.len()]
    }

    /// Random pause drawn uniformly from `[min_delay, max_delay]`
    pub fn backoff_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Fetches transcripts through an ordered list of routes, pausing between attempts
///
/// The first attempt goes through the proxied source when one is configured. Every
/// attempt, including the first after a failed proxy call, then tries the direct source
/// with that attempt's language preferences. The last error is returned when all
/// attempts fail.
pub struct RetryOrchestrator {
    direct: Arc<dyn TranscriptSource>,
    proxied: Option<Arc<dyn TranscriptSource>>,
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    pub fn new(
        direct: Arc<dyn TranscriptSource>,
        proxied: Option<Arc<dyn TranscriptSource>>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            direct,
            proxied,
            policy,
        }
    }

    /// Build YouTube sources and the retry policy from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let direct: Arc<dyn TranscriptSource> = Arc::new(YoutubeSource::direct(&config.youtube)?);

        let proxied = match config.retry.proxy_url.as_deref() {
            Some(url) => {
                let source: Arc<dyn TranscriptSource> =
                    Arc::new(YoutubeSource::proxied(&config.youtube, url)?);
                Some(source)
            }
            None => None,
        };

        Ok(Self::new(direct, proxied, config.retry_policy()))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch with the configured number of attempts
    pub async fn fetch(&self, video_id: &str) -> Result<Transcript, FetchError> {
        self.fetch_with_attempts(video_id, self.policy.max_attempts).await
    }

    /// Fetch with an explicit number of attempts
    pub async fn fetch_with_attempts(
        &self,
        video_id: &str,
        max_attempts: u32,
    ) -> Result<Transcript, FetchError> {
        let mut last_error = None;

        for attempt in 0..max_attempts {
            let languages = self.policy.languages_for(attempt);

            if attempt == 0 {
                if let Some(proxied) = &self.proxied {
                    match proxied.fetch_transcript(video_id, languages).await {
                        Ok(transcript) => return Ok(transcript),
                        Err(e) => {
                            // The direct call below always runs and supplies the error to report
                            tracing::warn!("{} attempt for {} failed: {}", proxied.route_name(), video_id, e);
                        }
                    }
                }
            }

            match self.direct.fetch_transcript(video_id, languages).await {
                Ok(transcript) => {
                    if attempt > 0 {
                        tracing::info!("Fetched {} on attempt {}/{}", video_id, attempt + 1, max_attempts);
                    }
                    return Ok(transcript);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} via {} failed: {}",
                        attempt + 1,
                        max_attempts,
                        video_id,
                        self.direct.route_name(),
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt + 1 < max_attempts {
                let delay = self.policy.backoff_delay();
                tracing::debug!("Waiting {:?} before the next attempt for {}", delay, video_id);
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            FetchError::Other(format!("All attempts to fetch the transcript for {} failed", video_id))
        }))
    }
}
