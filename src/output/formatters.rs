use anyhow::Result;

use crate::transcript::TranscriptEntry;
use crate::utils::{format_clock, format_srt_timestamp, format_vtt_timestamp};

/// Timestamped plain text: each entry as `M:SS` on one line and its text on the next
pub fn format_as_text(entries: &[TranscriptEntry]) -> String {
    let mut output = String::new();
    for entry in entries {
        output.push_str(&format_clock(entry.start));
        output.push('\n');
        output.push_str(&entry.text);
        output.push('\n');
    }
    output
}

/// Pretty-printed JSON array of `{start, duration, text}` objects
pub fn format_as_json(entries: &[TranscriptEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// SRT subtitles
pub fn format_as_srt(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_srt_timestamp(entry.start),
                format_srt_timestamp(entry.end()),
                entry.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// WebVTT subtitles
pub fn format_as_vtt(entries: &[TranscriptEntry]) -> String {
    let mut output = String::from("WEBVTT\n");
    for entry in entries {
        output.push_str(&format!(
            "\n{} --> {}\n{}\n",
            format_vtt_timestamp(entry.start),
            format_vtt_timestamp(entry.end()),
            entry.text
        ));
    }
    output
}
