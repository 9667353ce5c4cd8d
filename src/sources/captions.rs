//! Parsing of the YouTube pages and payloads that lead to a caption track.
//!
//! The flow is: watch page (api key, consent, captcha) -> innertube player response
//! (playability, caption track list) -> timed-text XML (entries).

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::transcript::TranscriptEntry;
use crate::utils::{decode_entities, looks_like_url};
use crate::FetchError;

const CONSENT_FORM_ACTION: &str = "action=\"https://consent.youtube.com/s\"";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";
const UNAVAILABLE_REASON: &str = "This video is unavailable";

/// A caption track listed in the player response
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    /// Timed-text URL, already stripped of the srv3 format switch
    pub base_url: String,

    /// Display name of the track
    pub name: String,

    /// Language code, e.g. "en" or "pt-BR"
    pub language_code: String,

    /// Auto-generated (ASR) track
    pub is_generated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<RawCaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    name: Option<TrackName>,
    language_code: String,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    #[serde(default)]
    runs: Vec<TextRun>,
    simple_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl From<RawCaptionTrack> for CaptionTrack {
    fn from(raw: RawCaptionTrack) -> Self {
        let name = raw
            .name
            .and_then(|name| {
                name.runs
                    .into_iter()
                    .next()
                    .map(|run| run.text)
                    .or(name.simple_text)
            })
            .unwrap_or_else(|| raw.language_code.clone());

        Self {
            base_url: raw.base_url.replace("&fmt=srv3", ""),
            name,
            is_generated: raw.kind.as_deref() == Some("asr"),
            language_code: raw.language_code,
        }
    }
}

fn api_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("api key pattern is valid")
    })
}

fn consent_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"name="v" value="([^"]*)""#).expect("consent pattern is valid"))
}

fn text_element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("text element pattern is valid")
    })
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"([\w-]+)="([^"]*)""#).expect("attribute pattern is valid"))
}

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"))
}

/// Innertube API key embedded in the watch page
pub fn extract_api_key(html: &str) -> Option<String> {
    api_key_pattern()
        .captures(html)
        .map(|caps| caps[1].to_string())
}

/// The watch page was replaced by the EU cookie consent form
pub fn is_consent_page(html: &str) -> bool {
    html.contains(CONSENT_FORM_ACTION)
}

/// Token to put in the `CONSENT` cookie, read from the consent form
pub fn consent_token(html: &str) -> Option<String> {
    consent_token_pattern()
        .captures(html)
        .map(|caps| caps[1].to_string())
}

/// The watch page is a captcha challenge, which YouTube serves to blocked addresses
pub fn has_recaptcha(html: &str) -> bool {
    html.contains(RECAPTCHA_MARKER)
}

/// Check playability and list the caption tracks of a player response
pub fn inspect_player_response(video_id: &str, body: &str) -> Result<Vec<CaptionTrack>, FetchError> {
    let response: PlayerResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Unparsable(format!("player response: {}", e)))?;

    if let Some(status) = &response.playability_status {
        if status.status != "OK" {
            let reason = status.reason.clone().unwrap_or_default();
            return Err(playability_error(video_id, &status.status, reason));
        }
    }

    let tracks = response
        .captions
        .and_then(|captions| captions.player_captions_tracklist_renderer)
        .map(|renderer| renderer.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(FetchError::TranscriptsDisabled(video_id.to_string()));
    }

    Ok(tracks.into_iter().map(CaptionTrack::from).collect())
}

fn playability_error(video_id: &str, status: &str, reason: String) -> FetchError {
    match status {
        "LOGIN_REQUIRED" if reason.contains("not a bot") => FetchError::RequestBlocked(reason),
        "LOGIN_REQUIRED" if reason.contains("inappropriate") => {
            FetchError::AgeRestricted(video_id.to_string())
        }
        "ERROR" if reason == UNAVAILABLE_REASON => {
            if looks_like_url(video_id) {
                FetchError::InvalidVideoId(video_id.to_string())
            } else {
                FetchError::VideoUnavailable(video_id.to_string())
            }
        }
        _ => FetchError::VideoUnplayable {
            video_id: video_id.to_string(),
            reason: if reason.is_empty() { status.to_string() } else { reason },
        },
    }
}

/// Pick the track to fetch
///
/// Requested codes are tried in order; for each code a manually created track wins over a
/// generated one. With no requested codes the first manual track is used, else the first
/// generated one.
pub fn select_track<'a>(
    video_id: &str,
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Result<&'a CaptionTrack, FetchError> {
    let find = |code: Option<&str>, generated: bool| {
        tracks.iter().find(|track| {
            track.is_generated == generated
                && code.map_or(true, |code| track.language_code == code)
        })
    };

    let selected = if languages.is_empty() {
        find(None, false).or_else(|| find(None, true))
    } else {
        languages
            .iter()
            .find_map(|code| {
                find(Some(code.as_str()), false).or_else(|| find(Some(code.as_str()), true))
            })
    };

    selected.ok_or_else(|| FetchError::NoTranscriptFound {
        video_id: video_id.to_string(),
        requested: languages.to_vec(),
        available: tracks.iter().map(|t| t.language_code.clone()).collect(),
    })
}

/// Parse a timed-text document into transcript entries
///
/// Self-closing and empty elements are skipped. Bodies are unescaped twice because YouTube
/// escapes caption text before embedding it in the XML.
pub fn parse_timed_text(xml: &str) -> Result<Vec<TranscriptEntry>, FetchError> {
    if xml.trim().is_empty() {
        return Err(FetchError::Unparsable("empty timed-text response".to_string()));
    }

    let mut entries = Vec::new();

    for caps in text_element_pattern().captures_iter(xml) {
        let Some(body) = caps.get(2).filter(|body| !body.as_str().is_empty()) else {
            continue;
        };

        let mut start = None;
        let mut duration = 0.0;
        for attr in attribute_pattern().captures_iter(&caps[1]) {
            match &attr[1] {
                "start" => start = attr[2].parse::<f64>().ok(),
                "dur" => duration = attr[2].parse::<f64>().unwrap_or(0.0),
                _ => {}
            }
        }

        let start = start.ok_or_else(|| {
            FetchError::Unparsable("timed-text element without a start time".to_string())
        })?;

        let text = decode_entities(&decode_entities(body.as_str()));
        let text = markup_pattern().replace_all(&text, "");

        entries.push(TranscriptEntry::new(start, duration, text));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(code: &str, generated: bool) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{}", code),
            name: code.to_string(),
            language_code: code.to_string(),
            is_generated: generated,
        }
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSyA-key_1"});</script>"#;
        assert_eq!(extract_api_key(html), Some("AIzaSyA-key_1".to_string()));
        assert_eq!(extract_api_key("<html></html>"), None);
    }

    #[test]
    fn test_consent_page() {
        let html = r#"<form action="https://consent.youtube.com/s"><input name="v" value="cb.20210328-17-p0.en+FX+229"></form>"#;
        assert!(is_consent_page(html));
        assert_eq!(consent_token(html), Some("cb.20210328-17-p0.en+FX+229".to_string()));
        assert!(!is_consent_page("<html></html>"));
    }

    #[test]
    fn test_inspect_lists_tracks() {
        let body = r#"{
            "playabilityStatus": {"status": "OK"},
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": "https://www.youtube.com/api/timedtext?v=x&lang=en&fmt=srv3", "name": {"runs": [{"text": "English"}]}, "languageCode": "en"},
                {"baseUrl": "https://www.youtube.com/api/timedtext?v=x&lang=de&kind=asr", "name": {"simpleText": "German (auto-generated)"}, "languageCode": "de", "kind": "asr"}
            ]}}
        }"#;

        let tracks = inspect_player_response("x", body).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].base_url, "https://www.youtube.com/api/timedtext?v=x&lang=en");
        assert_eq!(tracks[0].name, "English");
        assert!(!tracks[0].is_generated);
        assert_eq!(tracks[1].name, "German (auto-generated)");
        assert!(tracks[1].is_generated);
    }

    #[test]
    fn test_inspect_without_captions_is_disabled() {
        let body = r#"{"playabilityStatus": {"status": "OK"}}"#;
        assert!(matches!(
            inspect_player_response("abc", body),
            Err(FetchError::TranscriptsDisabled(id)) if id == "abc"
        ));
    }

    #[test]
    fn test_inspect_playability_errors() {
        let unavailable = r#"{"playabilityStatus": {"status": "ERROR", "reason": "This video is unavailable"}}"#;
        assert!(matches!(
            inspect_player_response("abc", unavailable),
            Err(FetchError::VideoUnavailable(_))
        ));
        assert!(matches!(
            inspect_player_response("https://youtu.be/abc", unavailable),
            Err(FetchError::InvalidVideoId(_))
        ));

        let bot = r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "Sign in to confirm you’re not a bot"}}"#;
        assert!(matches!(
            inspect_player_response("abc", bot),
            Err(FetchError::RequestBlocked(_))
        ));

        let age = r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "This video may be inappropriate for some users."}}"#;
        assert!(matches!(
            inspect_player_response("abc", age),
            Err(FetchError::AgeRestricted(_))
        ));

        let private = r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "This video is private"}}"#;
        assert!(matches!(
            inspect_player_response("abc", private),
            Err(FetchError::VideoUnplayable { reason, .. }) if reason == "This video is private"
        ));
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(matches!(
            inspect_player_response("abc", "<html>"),
            Err(FetchError::Unparsable(_))
        ));
    }

    #[test]
    fn test_select_prefers_language_order_then_manual() {
        let tracks = vec![track("de", false), track("en", true), track("en", false)];

        let picked = select_track("v", &tracks, &langs(&["en", "de"])).unwrap();
        assert_eq!(picked.language_code, "en");
        assert!(!picked.is_generated);

        let picked = select_track("v", &tracks, &langs(&["fr", "de"])).unwrap();
        assert_eq!(picked.language_code, "de");
    }

    #[test]
    fn test_select_falls_back_to_generated() {
        let tracks = vec![track("en", true)];
        let picked = select_track("v", &tracks, &langs(&["en"])).unwrap();
        assert!(picked.is_generated);
    }

    #[test]
    fn test_select_any_track() {
        let tracks = vec![track("ja", true), track("ko", false)];
        assert_eq!(select_track("v", &tracks, &[]).unwrap().language_code, "ko");

        let generated_only = vec![track("ja", true)];
        assert_eq!(select_track("v", &generated_only, &[]).unwrap().language_code, "ja");
    }

    #[test]
    fn test_select_reports_available_languages() {
        let tracks = vec![track("de", false), track("fr", true)];
        match select_track("v", &tracks, &langs(&["en"])) {
            Err(FetchError::NoTranscriptFound { requested, available, .. }) => {
                assert_eq!(requested, vec!["en".to_string()]);
                assert_eq!(available, vec!["de".to_string(), "fr".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_timed_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="1.54">Hey there</text><text start="2.04" dur="2.1">it&amp;#39;s &lt;i&gt;fine&lt;/i&gt;</text><text start="4.2" dur="1"/><text start="5">no duration</text></transcript>"#;

        let entries = parse_timed_text(xml).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], TranscriptEntry::new(0.5, 1.54, "Hey there"));
        assert_eq!(entries[1].text, "it's fine");
        assert_eq!(entries[2], TranscriptEntry::new(5.0, 0.0, "no duration"));
    }

    #[test]
    fn test_parse_timed_text_skips_empty_elements() {
        let xml = r#"<transcript><text start="1" dur="2"></text><text start="3" dur="1">hi</text></transcript>"#;
        let entries = parse_timed_text(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], TranscriptEntry::new(3.0, 1.0, "hi"));
    }

    #[test]
    fn test_parse_timed_text_multiline_body() {
        let xml = "<transcript><text start=\"1\" dur=\"2\">first line\nsecond line</text></transcript>";
        let entries = parse_timed_text(xml).unwrap();
        assert_eq!(entries[0].text, "first line\nsecond line");
    }

    #[test]
    fn test_parse_timed_text_errors() {
        assert!(matches!(parse_timed_text("  "), Err(FetchError::Unparsable(_))));
        assert!(matches!(
            parse_timed_text("<transcript><text dur=\"1\">x</text></transcript>"),
            Err(FetchError::Unparsable(_))
        ));
        assert!(parse_timed_text("<transcript></transcript>").unwrap().is_empty());
    }
}
