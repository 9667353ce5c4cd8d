use serde::{Deserialize, Serialize};

pub mod retry;

/// Individual caption segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Caption text
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Transcript of one video together with the track it came from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// YouTube video id
    pub video_id: String,

    /// Human readable track name, e.g. "English (auto-generated)"
    pub language: String,

    /// Track language code, e.g. "en"
    pub language_code: String,

    /// Whether the track was generated by speech recognition
    pub is_generated: bool,

    /// Ordered caption segments
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seconds from zero to the end of the last segment
    pub fn duration(&self) -> f64 {
        self.entries.last().map(TranscriptEntry::end).unwrap_or(0.0)
    }
}
