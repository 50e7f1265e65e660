//! Cue Matching Module
//!
//! Pairs target cues with source cues into display rows by interval overlap.

mod matcher;

pub use matcher::{
    index_at_time, match_cue_lines, starts_new_row, CueLine, IndexedCue, MatchedCues,
    MATCH_OVERLAP_RATIO,
};
