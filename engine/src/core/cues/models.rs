//! Cue Data Models
//!
//! Defines data structures for cues and the tracks they belong to.
//!
//! # Overview
//!
//! A track pairs a target cue list (the one being authored) with an optional
//! source cue list (the reference a translation is written against). Cues carry
//! their own validation state (`corrupted`, `errors`) and an edit token used to
//! drop stale deferred edits.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::validation::ErrorTag;
use crate::core::{new_edit_token, CueId, EditToken, MediaChunk, TimeRange, TimeSec};

/// Start/end of the cue created when a track would otherwise become empty
pub const DEFAULT_CUE_START_SEC: TimeSec = 0.0;
pub const DEFAULT_CUE_END_SEC: TimeSec = 3.0;

fn new_cue_id() -> CueId {
    ulid::Ulid::new().to_string()
}

// =============================================================================
// Cue Categories
// =============================================================================

/// What kind of content a cue transcribes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CueCategory {
    #[default]
    Dialogue,
    OnScreenText,
    AudioDescription,
    Lyrics,
}

// =============================================================================
// Cue Positioning
// =============================================================================

/// Vertical position of the cue on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerticalPosition {
    /// Bottom of screen (default for subtitles)
    #[default]
    Bottom,
    /// Top of screen
    Top,
    /// Center of screen
    Center,
}

/// Horizontal alignment of cue text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Placement of a cue, inherited by the second half of a split
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "camelCase")]
pub struct CueStyle {
    pub vertical: VerticalPosition,
    pub alignment: TextAlignment,
}

// =============================================================================
// Decorations
// =============================================================================

/// Reviewer comment attached to a cue
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CueComment {
    pub author: String,
    pub text: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl CueComment {
    pub fn new(author: &str, text: &str) -> Self {
        Self {
            author: author.to_string(),
            text: text.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Glossary term found in the cue text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryMatch {
    pub source: String,
    pub replacement: String,
}

// =============================================================================
// Cue Entry
// =============================================================================

/// A single timed text unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Unique identifier
    #[serde(default = "new_cue_id")]
    pub id: CueId,
    /// Display interval in seconds
    pub interval: TimeRange,
    /// Cue text (may contain inline markup and line breaks)
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub category: CueCategory,
    /// Regenerated on every successful mutation
    #[serde(default = "new_edit_token")]
    pub edit_token: EditToken,
    /// Fails the rule check against its neighbours
    #[serde(default)]
    pub corrupted: bool,
    /// Tags from the most recent validation pass
    #[serde(default)]
    pub errors: Vec<ErrorTag>,
    /// Immutable cue, skipped by every mutation
    #[serde(default)]
    pub edit_disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CueComment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary_matches: Vec<GlossaryMatch>,
    /// Spell-check payload, opaque to matching and validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_check: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CueStyle>,
}

impl Cue {
    /// Creates a dialogue cue with a fresh id and token
    pub fn new(start_sec: TimeSec, end_sec: TimeSec, text: &str) -> Self {
        Self {
            id: new_cue_id(),
            interval: TimeRange::new(start_sec, end_sec),
            text: text.to_string(),
            category: CueCategory::Dialogue,
            edit_token: new_edit_token(),
            corrupted: false,
            errors: Vec::new(),
            edit_disabled: false,
            comments: Vec::new(),
            glossary_matches: Vec::new(),
            spell_check: None,
            style: None,
        }
    }

    /// The empty cue a track falls back to when its last cue is deleted
    pub fn default_empty() -> Self {
        Self::new(DEFAULT_CUE_START_SEC, DEFAULT_CUE_END_SEC, "")
    }

    pub fn with_category(mut self, category: CueCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_style(mut self, style: CueStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Marks the cue immutable
    pub fn disabled(mut self) -> Self {
        self.edit_disabled = true;
        self
    }

    pub fn start(&self) -> TimeSec {
        self.interval.start_sec
    }

    pub fn end(&self) -> TimeSec {
        self.interval.end_sec
    }

    /// Returns the duration of this cue in seconds
    pub fn duration(&self) -> TimeSec {
        self.interval.duration()
    }

    /// Returns true if this cue overlaps with another
    pub fn overlaps(&self, other: &Cue) -> bool {
        self.interval.overlaps(&other.interval)
    }

    /// Issues a new edit token, invalidating every deferred edit captured so far
    pub fn refresh_token(&mut self) {
        self.edit_token = new_edit_token();
    }

    /// Whether the timing and text a user can observe are identical
    pub fn same_content(&self, other: &Cue) -> bool {
        self.interval.same_as(&other.interval)
            && self.text == other.text
            && self.category == other.category
    }

    /// Records tags from a validation pass without duplicates
    pub fn set_errors(&mut self, errors: &[ErrorTag]) {
        self.errors.clear();
        self.add_errors(errors);
    }

    /// Appends tags not already recorded
    pub fn add_errors(&mut self, errors: &[ErrorTag]) {
        for tag in errors {
            if !self.errors.contains(tag) {
                self.errors.push(*tag);
            }
        }
    }
}

impl Default for Cue {
    fn default() -> Self {
        Self::default_empty()
    }
}

// =============================================================================
// Track Metadata
// =============================================================================

/// Whether the target track is authored from scratch or against a source track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    #[default]
    Caption,
    Translation,
}

/// Track-level settings consulted by validation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct TrackMeta {
    #[serde(default)]
    pub kind: TrackKind,
    /// Language code (e.g., "en", "ko", "ja")
    #[serde(default)]
    pub language: String,
    /// Whether neighbouring cues may overlap in time
    #[serde(default)]
    pub overlap_enabled: bool,
    /// Editable media window, when the track is edited in chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_chunk: Option<MediaChunk>,
}

impl TrackMeta {
    pub fn caption(language: &str) -> Self {
        Self {
            kind: TrackKind::Caption,
            language: language.to_string(),
            overlap_enabled: false,
            media_chunk: None,
        }
    }

    pub fn translation(language: &str) -> Self {
        Self {
            kind: TrackKind::Translation,
            ..Self::caption(language)
        }
    }

    pub fn with_overlap(mut self, enabled: bool) -> Self {
        self.overlap_enabled = enabled;
        self
    }

    pub fn with_media_chunk(mut self, chunk: MediaChunk) -> Self {
        self.media_chunk = Some(chunk);
        self
    }
}

impl Default for TrackMeta {
    fn default() -> Self {
        Self::caption("en")
    }
}

// =============================================================================
// Tests
// =============================================================================
