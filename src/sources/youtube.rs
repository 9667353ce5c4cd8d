use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, Proxy, StatusCode};
use serde_json::json;
use std::time::Duration;

use super::captions::{self, CaptionTrack};
use super::TranscriptSource;
use crate::config::YoutubeConfig;
use crate::transcript::Transcript;
use crate::{FetchError, Result};

/// Innertube client identity sent with player requests
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Timed-text URLs carrying this flag need a PO token we cannot produce
const PO_TOKEN_MARKER: &str = "&exp=xpe";

/// YouTube transcript source talking to the watch page and the innertube player API
pub struct YoutubeSource {
    client: Client,
    base_url: String,
    route: &'static str,
}

impl YoutubeSource {
    /// Source that connects directly, ignoring proxy environment variables
    pub fn direct(config: &YoutubeConfig) -> Result<Self> {
        let client = Self::client_builder(config)
            .no_proxy()
            .build()
            .context("Failed to build direct HTTP client")?;

        Ok(Self::with_client(client, &config.base_url, "direct"))
    }

    /// Source that routes every request through `proxy_url` (e.g. a local SOCKS5 proxy)
    pub fn proxied(config: &YoutubeConfig, proxy_url: &str) -> Result<Self> {
        let proxy = Proxy::all(proxy_url)
            .with_context(|| format!("Invalid proxy URL: {}", proxy_url))?;

        let client = Self::client_builder(config)
            .proxy(proxy)
            .build()
            .context("Failed to build proxied HTTP client")?;

        Ok(Self::with_client(client, &config.base_url, "proxy"))
    }

    /// Source over a caller-provided client
    pub fn with_client(client: Client, base_url: &str, route: &'static str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            route,
        }
    }

    fn client_builder(config: &YoutubeConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
    }

    /// Fetch the watch page, accepting the cookie consent form once if YouTube shows it
    async fn fetch_watch_page(&self, video_id: &str) -> std::result::Result<String, FetchError> {
        let url = format!("{}/watch?v={}", self.base_url, urlencoding::encode(video_id));

        let html = self.get_text(&url, None).await?;
        if !captions::is_consent_page(&html) {
            return Ok(html);
        }

        tracing::debug!("Consent page served for {} via {}, retrying with cookie", video_id, self.route);

        let token = captions::consent_token(&html)
            .ok_or_else(|| FetchError::RequestFailed("could not read consent token".to_string()))?;
        let cookie = format!("CONSENT=YES+{}", token);

        let html = self.get_text(&url, Some(&cookie)).await?;
        if captions::is_consent_page(&html) {
            return Err(FetchError::RequestFailed("consent cookie was not accepted".to_string()));
        }

        Ok(html)
    }

    async fn get_text(&self, url: &str, cookie: Option<&str>) -> std::result::Result<String, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, "en-US");

        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await?;
        check_status(response.status())?;

        Ok(response.text().await?)
    }

    /// Ask the innertube player endpoint for the caption track list
    async fn fetch_caption_tracks(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> std::result::Result<Vec<CaptionTrack>, FetchError> {
        let url = format!("{}/youtubei/v1/player?key={}", self.base_url, api_key);
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .json(&body)
            .send()
            .await?;
        check_status(response.status())?;

        let text = response.text().await?;
        captions::inspect_player_response(video_id, &text)
    }
}

/// Map non-success statuses; 429 is how YouTube answers a blocked address
fn check_status(status: StatusCode) -> std::result::Result<(), FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::IpBlocked);
    }

    if !status.is_success() {
        return Err(FetchError::RequestFailed(format!("HTTP {}", status)));
    }

    Ok(())
}

#[async_trait]
impl TranscriptSource for YoutubeSource {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Transcript, FetchError> {
        tracing::debug!("Fetching transcript for {} via {} (languages: {:?})", video_id, self.route, languages);

        let html = self.fetch_watch_page(video_id).await?;

        let api_key = match captions::extract_api_key(&html) {
            Some(key) => key,
            None if captions::has_recaptcha(&html) => return Err(FetchError::IpBlocked),
            None => {
                return Err(FetchError::Unparsable(
                    "watch page has no innertube api key".to_string(),
                ))
            }
        };

        let tracks = self.fetch_caption_tracks(video_id, &api_key).await?;
        let track = captions::select_track(video_id, &tracks, languages)?;

        if track.base_url.contains(PO_TOKEN_MARKER) {
            return Err(FetchError::RequestBlocked(
                "timed-text URL requires a PO token".to_string(),
            ));
        }

        let xml = self.get_text(&track.base_url, None).await?;
        let entries = captions::parse_timed_text(&xml)?;

        tracing::debug!(
            "Fetched {} entries for {} ({}, generated: {}) via {}",
            entries.len(),
            video_id,
            track.language_code,
            track.is_generated,
            self.route
        );

        Ok(Transcript {
            video_id: video_id.to_string(),
            language: track.name.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            entries,
        })
    }

    fn route_name(&self) -> &'static str {
        self.route
    }
}
