//! Interval Matcher
//!
//! Walks the target and source cue lists once, in start order, and groups
//! cues whose intervals substantially overlap into the same row. The result is
//! recomputed from scratch whenever either list changes.
//!
//! ```text
//! target  |--0--|  |----1----|
//! source  |--0--|  |-1-||-2-|
//! rows    [t0,s0]  [t1,s1,s2]
//! ```

use serde::Serialize;
use tracing::trace;

use crate::core::cues::Cue;
use crate::core::{CueIndex, TimeSec, TIME_EPSILON};

/// Share of the shorter cue's duration its overlap with the longer cue must
/// exceed for both to stay on the same row
pub const MATCH_OVERLAP_RATIO: f64 = 0.65;

/// Whether the row cursor advances after emitting a cue of `duration` that
/// overlaps the other list's current cue by `overlap`
pub fn starts_new_row(overlap: TimeSec, duration: TimeSec) -> bool {
    overlap <= MATCH_OVERLAP_RATIO * duration
}

/// A cue together with its position in its own list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedCue<'a> {
    pub index: CueIndex,
    pub cue: &'a Cue,
}

/// One display row pairing target cues with source cues
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CueLine<'a> {
    pub target_cues: Vec<IndexedCue<'a>>,
    pub source_cues: Vec<IndexedCue<'a>>,
}

impl<'a> CueLine<'a> {
    pub fn target_indices(&self) -> impl Iterator<Item = CueIndex> + '_ {
        self.target_cues.iter().map(|c| c.index)
    }

    pub fn source_indices(&self) -> impl Iterator<Item = CueIndex> + '_ {
        self.source_cues.iter().map(|c| c.index)
    }

    pub fn is_target_only(&self) -> bool {
        self.source_cues.is_empty()
    }
}

/// Rows in chronological order plus the row holding the cue being edited
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedCues<'a> {
    pub rows: Vec<CueLine<'a>>,
    pub editing_row_index: usize,
}

enum Side {
    Target,
    Source,
}

struct RowWriter<'a> {
    rows: Vec<CueLine<'a>>,
    cursor: usize,
}

impl<'a> RowWriter<'a> {
    /// Rows are created on first write, so no row is ever empty
    fn row(&mut self) -> &mut CueLine<'a> {
        if self.cursor == self.rows.len() {
            self.rows.push(CueLine::default());
        }
        &mut self.rows[self.cursor]
    }

    fn emit(&mut self, side: Side, index: CueIndex, cue: &'a Cue) {
        let entry = IndexedCue { index, cue };
        match side {
            Side::Target => self.row().target_cues.push(entry),
            Side::Source => self.row().source_cues.push(entry),
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }
}

fn same_interval(a: &Cue, b: &Cue) -> bool {
    a.interval.same_as(&b.interval)
}

/// `a` ends first, or ends together with `b` but starts later
fn ends_first(a: &Cue, b: &Cue) -> bool {
    a.end() < b.end() - TIME_EPSILON
        || ((a.end() - b.end()).abs() <= TIME_EPSILON && a.start() > b.start())
}

/// Groups target and source cues into rows.
///
/// Both lists must be sorted by start time. `editing_index` is the target cue
/// whose row is reported as `editing_row_index` (0 when it is out of range).
pub fn match_cue_lines<'a>(
    target: &'a [Cue],
    source: &'a [Cue],
    editing_index: CueIndex,
) -> MatchedCues<'a> {
    let mut writer = RowWriter {
        rows: Vec::with_capacity(target.len().max(source.len())),
        cursor: 0,
    };
    let mut editing_row_index = 0;
    let (mut t, mut s) = (0usize, 0usize);

    while t < target.len() || s < source.len() {
        match (target.get(t), source.get(s)) {
            (Some(target_cue), None) => {
                if t == editing_index {
                    editing_row_index = writer.cursor;
                }
                writer.emit(Side::Target, t, target_cue);
                t += 1;
                writer.advance();
            }
            (None, Some(source_cue)) => {
                writer.emit(Side::Source, s, source_cue);
                s += 1;
                writer.advance();
            }
            (Some(target_cue), Some(source_cue)) => {
                let overlap = target_cue.interval.overlap_with(&source_cue.interval);
                let target_goes_now =
                    same_interval(target_cue, source_cue) || ends_first(target_cue, source_cue);
                if target_goes_now && t == editing_index {
                    editing_row_index = writer.cursor;
                }

                if same_interval(target_cue, source_cue) {
                    writer.emit(Side::Target, t, target_cue);
                    writer.emit(Side::Source, s, source_cue);
                    t += 1;
                    s += 1;
                    writer.advance();
                } else if ends_first(target_cue, source_cue) {
                    writer.emit(Side::Target, t, target_cue);
                    t += 1;
                    if starts_new_row(overlap, target_cue.duration()) {
                        writer.advance();
                    }
                } else {
                    writer.emit(Side::Source, s, source_cue);
                    s += 1;
                    if starts_new_row(overlap, source_cue.duration()) {
                        writer.advance();
                    }
                }
            }
            (None, None) => break,
        }
    }

    trace!(
        target = target.len(),
        source = source.len(),
        rows = writer.rows.len(),
        editing_row_index,
        "Matched cue lines"
    );

    MatchedCues {
        rows: writer.rows,
        editing_row_index,
    }
}

/// Index of the last cue starting at or before `time_sec`, or 0
pub fn index_at_time(cues: &[Cue], time_sec: TimeSec) -> CueIndex {
    cues.iter()
        .rposition(|cue| cue.start() <= time_sec)
        .unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
