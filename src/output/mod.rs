use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcript::Transcript;

pub mod formatters;

pub use formatters::*;

/// Render a transcript in the requested format
pub fn render(transcript: &Transcript, format: &OutputFormat) -> Result<String> {
    let entries = &transcript.entries;
    let content = match format {
        OutputFormat::Text => format_as_text(entries),
        OutputFormat::Json => format_as_json(entries)?,
        OutputFormat::Srt => format_as_srt(entries),
        OutputFormat::Vtt => format_as_vtt(entries),
    };
    Ok(content)
}

/// Save transcript to file
pub fn save_to_file(transcript: &Transcript, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(transcript, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcript to console
pub fn print_to_console(transcript: &Transcript, format: &OutputFormat) -> Result<()> {
    let content = render(transcript, format)?;
    print!("{}", content);
    Ok(())
}
