//! Subtitle Format Parsers and Exporters
//!
//! Supports loading and saving cue lists in:
//! - SRT (SubRip)
//! - VTT (WebVTT)
//!
//! Parsed cues get fresh ids and edit tokens; validation flags are left to
//! `mark_cues`, which every load path runs afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use cuesync_lib::core::cues::{parse_srt, export_vtt};
//!
//! let srt_content = std::fs::read_to_string("subtitles.srt")?;
//! let cues = parse_srt(&srt_content)?;
//! let vtt_content = export_vtt(&cues);
//! ```

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use super::markup::retain_style_tags;
use super::Cue;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during subtitle parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid timestamp format
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Invalid cue block
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Unexpected end of input
    #[error("Unexpected end of input")]
    UnexpectedEnd,
}

// =============================================================================
// Format Detection
// =============================================================================

/// On-disk track formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    Srt,
    Vtt,
    /// `TrackDocument` JSON
    Json,
}

impl TrackFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::Vtt),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Json => "json",
        }
    }
}

// =============================================================================
// Shared Block Reader
// =============================================================================

/// Reads `timestamp line + text lines` blocks separated by blank lines.
/// Cues with a non-positive duration are dropped with a warning.
fn read_blocks<'a, F>(
    lines: &mut std::iter::Peekable<impl Iterator<Item = &'a str>>,
    parse_timing: F,
) -> Result<Vec<Cue>, ParseError>
where
    F: Fn(&str) -> Result<(f64, f64), ParseError>,
{
    let mut cues = Vec::new();

    loop {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        let Some(first_line) = lines.next() else {
            break;
        };

        // Sequence numbers and cue identifiers precede the timing line.
        let timestamp_line = if first_line.contains("-->") {
            first_line
        } else {
            lines.next().ok_or(ParseError::UnexpectedEnd)?
        };
        let (start_sec, end_sec) = parse_timing(timestamp_line)?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text_lines.push(retain_style_tags(line.trim_end_matches('\r')));
        }

        if end_sec <= start_sec {
            warn!(
                start_sec,
                end_sec, "Skipping cue with non-positive duration during import"
            );
            continue;
        }
        cues.push(Cue::new(start_sec, end_sec, &text_lines.join("\n")));
    }

    Ok(cues)
}

fn split_timing_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (start, end_part) = line.split_once("-->").ok_or_else(|| {
        ParseError::InvalidFormat(format!("Expected 'start --> end' format: {}", line))
    })?;
    let end_part = end_part.trim();
    // WebVTT cue settings may follow the end timestamp
    let end = end_part.split_whitespace().next().unwrap_or(end_part);
    Ok((start.trim(), end))
}

fn parse_component(part: &str, ts: &str) -> Result<f64, ParseError> {
    part.trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))
}

/// Parses `HH:MM:SS.mmm` or `MM:SS.mmm` (comma accepted as decimal mark)
fn parse_timestamp(ts: &str) -> Result<f64, ParseError> {
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let seconds = match parts.as_slice() {
        [m, s] => parse_component(m, ts)? * 60.0 + parse_component(s, ts)?,
        [h, m, s] => {
            parse_component(h, ts)? * 3600.0
                + parse_component(m, ts)? * 60.0
                + parse_component(s, ts)?
        }
        _ => return Err(ParseError::InvalidTimestamp(ts.to_string())),
    };

    if seconds < 0.0 || !seconds.is_finite() {
        return Err(ParseError::InvalidTimestamp(ts.to_string()));
    }
    Ok(seconds)
}

fn format_timestamp(seconds: f64, decimal_mark: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, mins, secs, decimal_mark, ms
    )
}

// =============================================================================
// SRT Format
// =============================================================================

/// Parses SRT (SubRip) content into a list of cues
///
/// # SRT Format
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// First caption text
///
/// 2
/// 00:00:05,500 --> 00:00:08,000
/// Second caption text
/// with multiple lines
/// ```
pub fn parse_srt(content: &str) -> Result<Vec<Cue>, ParseError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.lines().peekable();
    read_blocks(&mut lines, |line| {
        let (start, end) = split_timing_line(line)?;
        Ok((parse_timestamp(start)?, parse_timestamp(end)?))
    })
}

/// Exports cues to SRT format
pub fn export_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (index, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(cue.start(), ','),
            format_timestamp(cue.end(), ',')
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

// =============================================================================
// VTT Format
// =============================================================================

/// Parses WebVTT content into a list of cues
///
/// # VTT Format
///
/// ```text
/// WEBVTT
///
/// 00:00:01.000 --> 00:00:04.000
/// First caption text
///
/// 00:00:05.500 --> 00:00:08.000
/// Second caption text
/// ```
pub fn parse_vtt(content: &str) -> Result<Vec<Cue>, ParseError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.lines().peekable();

    match lines.next() {
        Some(first_line) if first_line.starts_with("WEBVTT") => {}
        _ => {
            return Err(ParseError::InvalidFormat(
                "VTT file must start with WEBVTT".to_string(),
            ))
        }
    }

    // Header metadata runs until the first blank line
    while lines.next_if(|l| !l.trim().is_empty()).is_some() {}

    read_blocks(&mut lines, |line| {
        let (start, end) = split_timing_line(line)?;
        Ok((parse_timestamp(start)?, parse_timestamp(end)?))
    })
}

/// Exports cues to WebVTT format
pub fn export_vtt(cues: &[Cue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(cue.start(), '.'),
            format_timestamp(cue.end(), '.')
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

// =============================================================================
// Tests
// =============================================================================
