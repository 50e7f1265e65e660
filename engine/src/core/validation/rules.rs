//! Validation Rules
//!
//! Built-in rules checked against a cue and its immediate neighbours, plus the
//! clamping primitives the edit pipeline applies to each cue edge.
//! Each rule implements the `CueRule` trait for consistent checking.

use super::violation::ErrorTag;
use super::ValidationContext;
use crate::core::cues::Cue;
use crate::core::{MediaChunk, TimeSec, TIME_EPSILON};

/// A cue together with its neighbours in track order
#[derive(Debug, Clone, Copy)]
pub struct CueWindow<'a> {
    pub previous: Option<&'a Cue>,
    pub current: &'a Cue,
    pub next: Option<&'a Cue>,
}

impl<'a> CueWindow<'a> {
    pub fn new(previous: Option<&'a Cue>, current: &'a Cue, next: Option<&'a Cue>) -> Self {
        Self {
            previous,
            current,
            next,
        }
    }

    /// Builds the window around `index`, or `None` when out of bounds
    pub fn at(cues: &'a [Cue], index: usize) -> Option<Self> {
        let current = cues.get(index)?;
        let previous = index.checked_sub(1).and_then(|i| cues.get(i));
        Some(Self::new(previous, current, cues.get(index + 1)))
    }
}

/// Trait for all cue rules
pub trait CueRule {
    /// Returns the unique name of this rule
    fn name(&self) -> &'static str;

    /// Returns a human-readable description
    fn description(&self) -> &'static str;

    /// Tag reported when the rule fails
    fn tag(&self) -> ErrorTag;

    /// Returns true when the window's current cue satisfies the rule
    fn check(&self, window: &CueWindow<'_>, ctx: &ValidationContext) -> bool;
}

// ============================================================================
// OverlapRule - neighbours must not overlap unless the track allows it
// ============================================================================

#[derive(Debug, Default)]
pub struct OverlapRule;

impl CueRule for OverlapRule {
    fn name(&self) -> &'static str {
        "OverlapRule"
    }

    fn description(&self) -> &'static str {
        "Cue must not overlap the previous or next cue"
    }

    fn tag(&self) -> ErrorTag {
        ErrorTag::TimeGapOverlap
    }

    fn check(&self, window: &CueWindow<'_>, ctx: &ValidationContext) -> bool {
        if ctx.overlap_allowed {
            return true;
        }
        let cue = window.current;
        let clear_of_previous = window
            .previous
            .is_none_or(|prev| cue.start() >= prev.end() - TIME_EPSILON);
        let clear_of_next = window
            .next
            .is_none_or(|next| cue.end() <= next.start() + TIME_EPSILON);
        clear_of_previous && clear_of_next
    }
}

// ============================================================================
// DurationRule - positive duration within the specification's limits
// ============================================================================

#[derive(Debug, Default)]
pub struct DurationRule;

impl CueRule for DurationRule {
    fn name(&self) -> &'static str {
        "DurationRule"
    }

    fn description(&self) -> &'static str {
        "Cue duration must be positive and within the specification's min/max"
    }

    fn tag(&self) -> ErrorTag {
        ErrorTag::InvalidRangeEnd
    }

    fn check(&self, window: &CueWindow<'_>, ctx: &ValidationContext) -> bool {
        ctx.spec.duration_fits(window.current.duration())
    }
}

// ============================================================================
// ChunkRangeRule - cue stays inside the editable media chunk
// ============================================================================

#[derive(Debug, Default)]
pub struct ChunkRangeRule;

impl CueRule for ChunkRangeRule {
    fn name(&self) -> &'static str {
        "ChunkRangeRule"
    }

    fn description(&self) -> &'static str {
        "Editable cue must lie inside the media chunk"
    }

    fn tag(&self) -> ErrorTag {
        ErrorTag::OutOfChunkRange
    }

    fn check(&self, window: &CueWindow<'_>, ctx: &ValidationContext) -> bool {
        // Cues outside the chunk are normally the disabled ones around it.
        if window.current.edit_disabled {
            return true;
        }
        ctx.media_chunk
            .is_none_or(|chunk| chunk.contains_range(&window.current.interval))
    }
}

// ============================================================================
// LineLimitRule - line count and characters per line
// ============================================================================

#[derive(Debug, Default)]
pub struct LineLimitRule;

impl CueRule for LineLimitRule {
    fn name(&self) -> &'static str {
        "LineLimitRule"
    }

    fn description(&self) -> &'static str {
        "Cue text must respect the line count and characters-per-line limits"
    }

    fn tag(&self) -> ErrorTag {
        ErrorTag::LineCountExceeded
    }

    fn check(&self, window: &CueWindow<'_>, ctx: &ValidationContext) -> bool {
        ctx.spec.text_fits(&window.current.text)
    }
}

/// Rules evaluated by the neighbour-aware conformance check, in order
pub fn built_in_rules() -> [&'static dyn CueRule; 4] {
    [&OverlapRule, &DurationRule, &ChunkRangeRule, &LineLimitRule]
}

// ============================================================================
// Edge clamps
// ============================================================================
//
// Each clamp adjusts one edge in place and returns true when it had to.

/// Start must not precede the previous cue's end
pub fn prevent_overlap_start(start: &mut TimeSec, previous: Option<&Cue>) -> bool {
    match previous {
        Some(prev) if *start < prev.end() - TIME_EPSILON => {
            *start = prev.end();
            true
        }
        _ => false,
    }
}

/// End must not pass the next cue's start
pub fn prevent_overlap_end(end: &mut TimeSec, next: Option<&Cue>) -> bool {
    match next {
        Some(next) if *end > next.start() + TIME_EPSILON => {
            *end = next.start();
            true
        }
        _ => false,
    }
}

/// Start must stay far enough before the next cue's start to leave room for
/// the minimum duration; only fires once the start reaches that cue
pub fn prevent_passing_next(start: &mut TimeSec, next: Option<&Cue>, min_sec: TimeSec) -> bool {
    match next {
        Some(next) if *start > next.start() - TIME_EPSILON => {
            *start = (next.start() - min_sec).max(0.0);
            true
        }
        _ => false,
    }
}

/// Moves the start so the duration lands within `[min, max]`
pub fn prevent_invalid_range_start(
    start: &mut TimeSec,
    end: TimeSec,
    min_sec: TimeSec,
    max_sec: Option<TimeSec>,
) -> bool {
    let duration = end - *start;
    if duration < min_sec - TIME_EPSILON {
        *start = (end - min_sec).max(0.0);
        return true;
    }
    if let Some(max) = max_sec {
        if duration > max + TIME_EPSILON {
            *start = end - max;
            return true;
        }
    }
    false
}

/// Moves the end so the duration lands within `[min, max]`
pub fn prevent_invalid_range_end(
    end: &mut TimeSec,
    start: TimeSec,
    min_sec: TimeSec,
    max_sec: Option<TimeSec>,
) -> bool {
    let duration = *end - start;
    if duration < min_sec - TIME_EPSILON {
        *end = start + min_sec;
        return true;
    }
    if let Some(max) = max_sec {
        if duration > max + TIME_EPSILON {
            *end = start + max;
            return true;
        }
    }
    false
}

/// Start must not precede the chunk's lower bound
pub fn prevent_out_of_chunk_start(start: &mut TimeSec, chunk: Option<MediaChunk>) -> bool {
    match chunk {
        Some(chunk) if *start < chunk.start_sec() - TIME_EPSILON => {
            *start = chunk.start_sec();
            true
        }
        _ => false,
    }
}

/// End must not pass the chunk's upper bound
pub fn prevent_out_of_chunk_end(end: &mut TimeSec, chunk: Option<MediaChunk>) -> bool {
    match chunk {
        Some(chunk) if *end > chunk.end_sec() + TIME_EPSILON => {
            *end = chunk.end_sec();
            true
        }
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
