//! Cue Validation Module
//!
//! Clamps proposed edits against neighbouring cues, the subtitle specification
//! and the media chunk, and flags cues that fail the neighbour-aware rules.

mod engine;
mod rules;
mod spec;
mod violation;

pub use engine::{
    apply_edit, check_track, conform_to_rules, conform_window, mark_cues, rule_failures,
    EditCorrection, ProposedEdit, ValidationContext, DEFAULT_MIN_DURATION_FLOOR_MS,
};
pub use rules::{
    built_in_rules, prevent_invalid_range_end, prevent_invalid_range_start, prevent_out_of_chunk_end,
    prevent_out_of_chunk_start, prevent_overlap_end, prevent_overlap_start, ChunkRangeRule, CueRule,
    CueWindow, DurationRule, LineLimitRule, OverlapRule,
};
pub use spec::SubtitleSpecification;
pub use violation::{CueViolation, ErrorTag};
