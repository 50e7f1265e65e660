//! Cuesync Core Type Definitions
//!
//! Defines fundamental types used throughout the project.
//! All types are exportable to TypeScript via specta.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Cue unique identifier (ULID)
pub type CueId = String;

/// Optimistic-concurrency token carried by every cue (UUID v4)
pub type EditToken = String;

/// Operation unique identifier (ULID)
pub type OpId = String;

/// Position of a cue inside its track
pub type CueIndex = usize;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Time in milliseconds, as used by subtitle specifications and media chunks
pub type TimeMs = u64;

/// Tolerance used when comparing cue edges for equality
pub const TIME_EPSILON: TimeSec = 1e-9;

/// Generates a fresh edit token
pub fn new_edit_token() -> EditToken {
    uuid::Uuid::new_v4().to_string()
}

/// Converts milliseconds to seconds
pub fn ms_to_sec(ms: TimeMs) -> TimeSec {
    ms as f64 / 1000.0
}

// =============================================================================
// Time Range
// =============================================================================

/// Time range of a cue, in seconds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl TimeRange {
    pub fn new(start_sec: TimeSec, end_sec: TimeSec) -> Self {
        if start_sec > end_sec {
            warn!(
                "TimeRange created with start > end ({} > {}), swapping",
                start_sec, end_sec
            );
            return Self {
                start_sec: end_sec,
                end_sec: start_sec,
            };
        }
        Self { start_sec, end_sec }
    }

    /// Returns duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Checks if a given time is within range
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time <= self.end_sec
    }

    /// Checks if two ranges overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_sec < other.end_sec && self.end_sec > other.start_sec
    }

    /// Length of the shared part of two ranges (0 when disjoint)
    pub fn overlap_with(&self, other: &TimeRange) -> TimeSec {
        let start = self.start_sec.max(other.start_sec);
        let end = self.end_sec.min(other.end_sec);
        (end - start).max(0.0)
    }

    /// Returns true when both edges match within [`TIME_EPSILON`]
    pub fn same_as(&self, other: &TimeRange) -> bool {
        (self.start_sec - other.start_sec).abs() < TIME_EPSILON
            && (self.end_sec - other.end_sec).abs() < TIME_EPSILON
    }

    /// Returns a copy moved by `delta_sec`
    pub fn shifted(&self, delta_sec: TimeSec) -> Self {
        Self {
            start_sec: self.start_sec + delta_sec,
            end_sec: self.end_sec + delta_sec,
        }
    }
}

// =============================================================================
// Media Chunk
// =============================================================================

/// Editable sub-range of the media, in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
}

impl MediaChunk {
    pub fn new(start_ms: TimeMs, end_ms: TimeMs) -> Self {
        if start_ms > end_ms {
            warn!(
                "MediaChunk created with start > end ({} > {}), swapping",
                start_ms, end_ms
            );
            return Self {
                start_ms: end_ms,
                end_ms: start_ms,
            };
        }
        Self { start_ms, end_ms }
    }

    pub fn start_sec(&self) -> TimeSec {
        ms_to_sec(self.start_ms)
    }

    pub fn end_sec(&self) -> TimeSec {
        ms_to_sec(self.end_ms)
    }

    /// Checks that a whole range lies inside the chunk
    pub fn contains_range(&self, range: &TimeRange) -> bool {
        range.start_sec >= self.start_sec() - TIME_EPSILON
            && range.end_sec <= self.end_sec() + TIME_EPSILON
    }
}
