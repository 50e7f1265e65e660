//! Validation Engine
//!
//! Runs the ordered correction pipeline for a single cue edit and the
//! neighbour-aware conformance checks used to flag corrupted cues.
//!
//! Rule order for an edit:
//!
//! ```text
//! start changed?  overlap -> range (min/max) -> chunk
//! end changed?    overlap -> range (min/max) -> chunk
//! text            line/character limits (revert, never truncate)
//! ```

use serde::{Deserialize, Serialize};
use specta::Type;

use super::rules::{self, built_in_rules, CueWindow};
use super::spec::SubtitleSpecification;
use super::violation::{CueViolation, ErrorTag};
use crate::core::cues::{Cue, CueCategory};
use crate::core::{ms_to_sec, MediaChunk, TimeMs, TimeRange, TimeSec, TIME_EPSILON};

/// Duration floor applied when no specification minimum is in force
pub const DEFAULT_MIN_DURATION_FLOOR_MS: TimeMs = 500;

// =============================================================================
// Validation Context
// =============================================================================

/// Everything the validator consults besides the cues themselves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContext {
    pub spec: SubtitleSpecification,
    /// Neighbouring cues may overlap
    pub overlap_allowed: bool,
    /// Editable media window
    pub media_chunk: Option<MediaChunk>,
    /// Last-resort minimum duration
    pub min_duration_floor_ms: TimeMs,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            spec: SubtitleSpecification::default(),
            overlap_allowed: false,
            media_chunk: None,
            min_duration_floor_ms: DEFAULT_MIN_DURATION_FLOOR_MS,
        }
    }
}

impl ValidationContext {
    pub fn new(spec: SubtitleSpecification, overlap_allowed: bool) -> Self {
        Self {
            spec,
            overlap_allowed,
            ..Default::default()
        }
    }

    pub fn with_media_chunk(mut self, chunk: Option<MediaChunk>) -> Self {
        self.media_chunk = chunk;
        self
    }

    pub fn floor_sec(&self) -> TimeSec {
        ms_to_sec(self.min_duration_floor_ms.max(1))
    }

    /// Minimum duration the edit pipeline clamps to
    pub fn min_duration_sec(&self) -> TimeSec {
        self.spec
            .min_duration_sec()
            .unwrap_or_else(|| self.floor_sec())
    }

    pub fn max_duration_sec(&self) -> Option<TimeSec> {
        self.spec.max_duration_sec()
    }
}

// =============================================================================
// Edit Pipeline
// =============================================================================

/// Timing and text a user proposes for a cue
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedEdit {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    pub text: String,
    pub category: CueCategory,
}

impl ProposedEdit {
    /// Starts from the cue's current values
    pub fn from_cue(cue: &Cue) -> Self {
        Self {
            start_sec: cue.start(),
            end_sec: cue.end(),
            text: cue.text.clone(),
            category: cue.category,
        }
    }

    pub fn with_start(mut self, start_sec: TimeSec) -> Self {
        self.start_sec = start_sec;
        self
    }

    pub fn with_end(mut self, end_sec: TimeSec) -> Self {
        self.end_sec = end_sec;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_category(mut self, category: CueCategory) -> Self {
        self.category = category;
        self
    }
}

/// Outcome of running one edit through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct EditCorrection {
    /// The cue as it should be stored
    pub cue: Cue,
    /// Rules that fired, in the order they fired
    pub violations: Vec<ErrorTag>,
    /// False when the corrected cue is observably identical to the original
    pub changed: bool,
}

fn push_tag(violations: &mut Vec<ErrorTag>, tag: ErrorTag) {
    if !violations.contains(&tag) {
        violations.push(tag);
    }
}

fn edge_moved(proposed: TimeSec, original: TimeSec) -> bool {
    (proposed - original).abs() > TIME_EPSILON
}

/// True when a moved edge landed inside a neighbour or the interval collapsed.
/// Edges the edit left alone are not judged, so a cue loaded overlapping its
/// neighbour can still be edited.
fn escapes_neighbours(
    start: TimeSec,
    end: TimeSec,
    original: &Cue,
    previous: Option<&Cue>,
    next: Option<&Cue>,
) -> bool {
    if end - start <= TIME_EPSILON {
        return true;
    }
    let outside = |t: TimeSec| {
        previous.is_some_and(|prev| t < prev.end() - TIME_EPSILON)
            || next.is_some_and(|next| t > next.start() + TIME_EPSILON)
    };
    (edge_moved(start, original.start()) && outside(start))
        || (edge_moved(end, original.end()) && outside(end))
}

/// Applies the ordered correction rules to a proposed edit.
///
/// Start-side rules only run when the start moved and end-side rules only
/// when the end moved, so a text-only edit never re-clamps untouched edges.
/// When no-overlap and the minimum duration cannot both hold, no-overlap wins
/// and the range tag still reports the shortfall. A moved edge that would
/// still land inside a neighbour falls back to the original interval.
pub fn apply_edit(
    original: &Cue,
    proposed: ProposedEdit,
    previous: Option<&Cue>,
    next: Option<&Cue>,
    ctx: ValidationContext,
) -> EditCorrection {
    let mut violations = Vec::new();
    let min_sec = ctx.min_duration_sec();
    let max_sec = ctx.max_duration_sec();

    let mut start = proposed.start_sec;
    let mut end = proposed.end_sec;

    if edge_moved(start, original.start()) {
        if !ctx.overlap_allowed && rules::prevent_passing_next(&mut start, next, min_sec) {
            push_tag(&mut violations, ErrorTag::TimeGapOverlap);
        }
        if start < 0.0 {
            start = 0.0;
            push_tag(&mut violations, ErrorTag::InvalidRangeStart);
        }
        if !ctx.overlap_allowed && rules::prevent_overlap_start(&mut start, previous) {
            push_tag(&mut violations, ErrorTag::TimeGapOverlap);
        }
        if rules::prevent_invalid_range_start(&mut start, end, min_sec, max_sec) {
            push_tag(&mut violations, ErrorTag::InvalidRangeStart);
            if !ctx.overlap_allowed && rules::prevent_overlap_start(&mut start, previous) {
                push_tag(&mut violations, ErrorTag::TimeGapOverlap);
            }
        }
        if rules::prevent_out_of_chunk_start(&mut start, ctx.media_chunk) {
            push_tag(&mut violations, ErrorTag::OutOfChunkRange);
        }
    }

    if edge_moved(end, original.end()) {
        if !ctx.overlap_allowed && rules::prevent_overlap_end(&mut end, next) {
            push_tag(&mut violations, ErrorTag::TimeGapOverlap);
        }
        if rules::prevent_invalid_range_end(&mut end, start, min_sec, max_sec) {
            push_tag(&mut violations, ErrorTag::InvalidRangeEnd);
            if !ctx.overlap_allowed && rules::prevent_overlap_end(&mut end, next) {
                push_tag(&mut violations, ErrorTag::TimeGapOverlap);
            }
        }
        if rules::prevent_out_of_chunk_end(&mut end, ctx.media_chunk) {
            push_tag(&mut violations, ErrorTag::OutOfChunkRange);
        }
    }

    if end - start <= TIME_EPSILON {
        end = start + ctx.floor_sec();
        push_tag(&mut violations, ErrorTag::InvalidRangeEnd);
    }

    if !ctx.overlap_allowed && escapes_neighbours(start, end, original, previous, next) {
        tracing::debug!(start, end, "Edit cannot fit between neighbours, keeping interval");
        start = original.start();
        end = original.end();
        push_tag(&mut violations, ErrorTag::TimeGapOverlap);
    }

    let text = if ctx.spec.text_fits(&proposed.text) || !ctx.spec.text_fits(&original.text) {
        proposed.text
    } else {
        push_tag(&mut violations, ErrorTag::LineCountExceeded);
        original.text.clone()
    };

    let mut cue = original.clone();
    cue.interval = TimeRange {
        start_sec: start,
        end_sec: end,
    };
    cue.text = text;
    cue.category = proposed.category;

    let changed = !cue.same_content(original);
    EditCorrection {
        cue,
        violations,
        changed,
    }
}

// =============================================================================
// Conformance
// =============================================================================

/// Tags of every built-in rule the window's current cue fails
pub fn rule_failures(window: &CueWindow<'_>, ctx: &ValidationContext) -> Vec<ErrorTag> {
    let mut failures = Vec::new();
    for rule in built_in_rules() {
        if !rule.check(window, ctx) {
            push_tag(&mut failures, rule.tag());
        }
    }
    failures
}

/// Neighbour-aware check: true when the current cue passes every rule
pub fn conform_to_rules(
    previous: Option<&Cue>,
    current: &Cue,
    next: Option<&Cue>,
    ctx: &ValidationContext,
) -> bool {
    rule_failures(&CueWindow::new(previous, current, next), ctx).is_empty()
}

fn record_failures(cue: &mut Cue, failures: &[ErrorTag]) {
    cue.corrupted = !failures.is_empty();
    cue.set_errors(failures);
}

/// Re-evaluates `corrupted` and `errors` of the cues around `index`.
///
/// Only flags change; timings are never touched here.
pub fn conform_window(cues: &mut [Cue], index: usize, ctx: &ValidationContext) {
    let first = index.saturating_sub(1);
    let last = (index + 1).min(cues.len().saturating_sub(1));
    for position in first..=last {
        if let Some(failures) = CueWindow::at(cues, position).map(|w| rule_failures(&w, ctx)) {
            record_failures(&mut cues[position], &failures);
        }
    }
}

/// Flags every cue of a freshly loaded track without correcting anything
pub fn mark_cues(cues: &mut [Cue], ctx: &ValidationContext) {
    let failures: Vec<Vec<ErrorTag>> = (0..cues.len())
        .map(|index| {
            CueWindow::at(cues, index)
                .map(|w| rule_failures(&w, ctx))
                .unwrap_or_default()
        })
        .collect();
    for (cue, failures) in cues.iter_mut().zip(failures) {
        record_failures(cue, &failures);
    }
}

/// Lists every rule failure in a track, for reports
pub fn check_track(cues: &[Cue], ctx: &ValidationContext) -> Vec<CueViolation> {
    let mut violations = Vec::new();
    for index in 0..cues.len() {
        let Some(window) = CueWindow::at(cues, index) else {
            continue;
        };
        for rule in built_in_rules() {
            if !rule.check(&window, ctx) {
                violations.push(CueViolation::new(
                    index,
                    rule.name(),
                    rule.tag(),
                    window.current.interval,
                    rule.description(),
                ));
            }
        }
    }
    violations
}

// =============================================================================
// Tests
// =============================================================================
