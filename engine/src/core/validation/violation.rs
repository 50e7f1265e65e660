//! Validation Violation Types
//!
//! Defines the rule tags reported by the validator and the per-cue report
//! produced when a whole track is checked.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::{CueIndex, TimeRange};

/// Rule violated (and usually corrected) during validation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorTag {
    /// Edge clamped against a neighbouring cue
    TimeGapOverlap,
    /// Start clamped to satisfy min/max duration
    InvalidRangeStart,
    /// End clamped to satisfy min/max duration
    InvalidRangeEnd,
    /// Edge clamped to the editable media chunk
    OutOfChunkRange,
    /// Text edit reverted for exceeding line/character limits
    LineCountExceeded,
    /// Split refused
    SplitError,
    /// Merge refused
    MergeError,
}

impl ErrorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorTag::TimeGapOverlap => "TIME_GAP_OVERLAP",
            ErrorTag::InvalidRangeStart => "INVALID_RANGE_START",
            ErrorTag::InvalidRangeEnd => "INVALID_RANGE_END",
            ErrorTag::OutOfChunkRange => "OUT_OF_CHUNK_RANGE",
            ErrorTag::LineCountExceeded => "LINE_COUNT_EXCEEDED",
            ErrorTag::SplitError => "SPLIT_ERROR",
            ErrorTag::MergeError => "MERGE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A rule failure found while checking a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CueViolation {
    /// Position of the offending cue
    pub index: CueIndex,
    /// Name of the rule that failed
    pub rule_name: String,
    pub tag: ErrorTag,
    /// Interval of the offending cue
    pub location: TimeRange,
    /// Human-readable message explaining the issue
    pub message: String,
}

impl CueViolation {
    pub fn new(
        index: CueIndex,
        rule_name: impl Into<String>,
        tag: ErrorTag,
        location: TimeRange,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            rule_name: rule_name.into(),
            tag,
            location,
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
