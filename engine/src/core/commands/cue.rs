//! Cue Commands Module
//!
//! Implements the single-cue edit and the structural cue operations (add,
//! delete, split, merge, shift). Timing problems on an edit are corrected and
//! reported as tags; structural operations that cannot be carried out are
//! rejected with `CoreError::Rejected` and leave the store untouched.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::{
    commands::{Command, CommandOutcome, CommandResult, StateChange},
    cues::{Cue, CueCategory, CueStore},
    ms_to_sec,
    validation::{apply_edit, EditCorrection, ErrorTag, ProposedEdit},
    CoreError, CoreResult, CueIndex, EditToken, TimeRange, TimeSec, TIME_EPSILON,
};

fn new_op_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Cue list captured around a structural command
#[derive(Clone, Debug, Default)]
struct Snapshot {
    before: Option<Vec<Cue>>,
    after: Option<Vec<Cue>>,
}

impl Snapshot {
    fn capture(store: &CueStore) -> Vec<Cue> {
        store.cues().to_vec()
    }

    fn undo(&self, store: &mut CueStore) {
        if let Some(before) = &self.before {
            store.restore_cues(before.clone());
        }
    }

    fn redo(&self, store: &mut CueStore) -> CoreResult<CommandResult> {
        let after = self
            .after
            .clone()
            .ok_or_else(|| CoreError::InvalidCommand("Command was never executed".into()))?;
        store.restore_cues(after);
        Ok(CommandResult::new(&new_op_id()).with_change(StateChange::CuesRestored))
    }
}

// =============================================================================
// UpdateCueCommand
// =============================================================================

/// Edits timing, text or category of one cue.
///
/// Carries the edit token captured when the edit began; when the live cue's
/// token differs the edit is dropped with `CommandOutcome::Discarded`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCueCommand {
    pub index: CueIndex,
    pub edit_token: EditToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_sec: Option<TimeSec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_sec: Option<TimeSec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CueCategory>,
    #[serde(skip)]
    previous: Option<Cue>,
    #[serde(skip)]
    applied: Option<Cue>,
}

impl UpdateCueCommand {
    pub fn new(index: CueIndex, edit_token: &str) -> Self {
        Self {
            index,
            edit_token: edit_token.to_string(),
            start_sec: None,
            end_sec: None,
            text: None,
            category: None,
            previous: None,
            applied: None,
        }
    }

    /// Captures the live token of the cue at `index`
    pub fn for_cue(store: &CueStore, index: CueIndex) -> CoreResult<Self> {
        Ok(Self::new(index, &store.get(index)?.edit_token))
    }

    pub fn with_start(mut self, start_sec: TimeSec) -> Self {
        self.start_sec = Some(start_sec);
        self
    }

    pub fn with_end(mut self, end_sec: TimeSec) -> Self {
        self.end_sec = Some(end_sec);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_category(mut self, category: CueCategory) -> Self {
        self.category = Some(category);
        self
    }

    fn proposal(&self, cue: &Cue) -> CoreResult<ProposedEdit> {
        let mut proposed = ProposedEdit::from_cue(cue);
        if let Some(start_sec) = self.start_sec {
            proposed.start_sec = start_sec;
        }
        if let Some(end_sec) = self.end_sec {
            proposed.end_sec = end_sec;
        }
        if let Some(text) = &self.text {
            proposed.text = text.clone();
        }
        if let Some(category) = self.category {
            proposed.category = category;
        }
        if !proposed.start_sec.is_finite() || !proposed.end_sec.is_finite() {
            return Err(CoreError::InvalidTimeRange(
                proposed.start_sec,
                proposed.end_sec,
            ));
        }
        Ok(proposed)
    }

    /// Stores `cue`, re-checks its window and keeps `corrections` on top of
    /// the rule failures the re-check records
    fn put(
        &self,
        store: &mut CueStore,
        cue: &Cue,
        corrections: &[ErrorTag],
    ) -> CoreResult<CommandResult> {
        let mut cue = cue.clone();
        cue.refresh_token();
        let cue_id = cue.id.clone();
        *store.cue_mut(self.index)? = cue;
        store.conform_window(self.index);
        store.cue_mut(self.index)?.add_errors(corrections);
        Ok(
            CommandResult::new(&new_op_id()).with_change(StateChange::CueModified {
                cue_id,
                index: self.index,
            }),
        )
    }
}

impl Command for UpdateCueCommand {
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        tracing::debug!(
            index = self.index,
            has_text = self.text.is_some(),
            has_time_range = self.start_sec.is_some() || self.end_sec.is_some(),
            "Updating cue"
        );

        let original = store.get_editable(self.index)?.clone();
        if original.edit_token != self.edit_token {
            tracing::debug!(index = self.index, "Discarding edit with stale token");
            return Ok(CommandResult::untouched(
                &new_op_id(),
                CommandOutcome::Discarded,
            ));
        }

        let proposed = self.proposal(&original)?;
        let (previous, next) = store.neighbors(self.index);
        let EditCorrection {
            cue: mut corrected,
            violations,
            changed,
        } = apply_edit(
            &original,
            proposed,
            previous,
            next,
            store.validation_context(),
        );

        if !changed {
            store.conform_window(self.index);
            store.cue_mut(self.index)?.add_errors(&violations);
            return Ok(
                CommandResult::untouched(&new_op_id(), CommandOutcome::Unchanged)
                    .with_violations(violations),
            );
        }

        corrected.set_errors(&violations);
        let result = self
            .put(store, &corrected, &violations)?
            .with_violations(violations);
        self.previous = Some(original);
        self.applied = Some(corrected);
        Ok(result)
    }

    fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
        if let Some(previous) = &self.previous {
            self.put(store, previous, &[])?;
        }
        Ok(())
    }

    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        let applied = self
            .applied
            .clone()
            .ok_or_else(|| CoreError::InvalidCommand("Cue edit was never applied".into()))?;
        self.put(store, &applied, &applied.errors)
    }

    fn type_name(&self) -> &'static str {
        "UpdateCue"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

// =============================================================================
// AddCueCommand
// =============================================================================

/// Inserts a new cue so that it ends up at `index`.
///
/// The cue starts where the previous cue ends (or at the source interval's
/// start when that does not precede it) and lasts the source interval, or the
/// default step capped by the maximum duration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCueCommand {
    pub index: CueIndex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_interval: Option<TimeRange>,
    #[serde(default)]
    pub text: String,
    #[serde(skip)]
    snapshot: Snapshot,
}

impl AddCueCommand {
    pub fn new(index: CueIndex) -> Self {
        Self {
            index,
            source_interval: None,
            text: String::new(),
            snapshot: Snapshot::default(),
        }
    }

    pub fn with_source_interval(mut self, interval: TimeRange) -> Self {
        self.source_interval = Some(interval);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn build_cue(&self, store: &CueStore) -> CoreResult<Cue> {
        let ctx = store.validation_context();
        let previous = self.index.checked_sub(1).and_then(|i| store.cues().get(i));
        let next = store.cues().get(self.index);
        let previous_end = previous.map(Cue::end).unwrap_or(0.0);

        let mut start = match self.source_interval {
            Some(source) if source.start_sec >= previous_end - TIME_EPSILON => source.start_sec,
            _ => previous_end,
        };
        let mut end = match self.source_interval {
            Some(source) => source.end_sec,
            None => {
                let step = ms_to_sec(store.default_step_ms);
                start + ctx.max_duration_sec().map_or(step, |max| max.min(step))
            }
        };

        if !ctx.overlap_allowed {
            if let Some(next) = next {
                end = end.min(next.start());
            }
        }
        if let Some(chunk) = ctx.media_chunk {
            start = start.max(chunk.start_sec());
            end = end.min(chunk.end_sec());
        }

        let duration = end - start;
        if !ctx.spec.duration_fits(duration) {
            return Err(CoreError::rejected(
                ErrorTag::InvalidRangeEnd,
                format!(
                    "No room for a new cue at index {} ({:.3}s available)",
                    self.index,
                    duration.max(0.0)
                ),
            ));
        }

        let category = previous.map(|c| c.category).unwrap_or_default();
        Ok(Cue::new(start, end, &self.text).with_category(category))
    }
}

impl Command for AddCueCommand {
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        if self.index > store.len() {
            return Err(CoreError::CueNotFound(self.index));
        }

        let cue = self.build_cue(store)?;
        let cue_id = cue.id.clone();
        tracing::debug!(
            index = self.index,
            start_sec = cue.start(),
            end_sec = cue.end(),
            "Adding cue"
        );

        self.snapshot.before = Some(Snapshot::capture(store));
        store.cues_mut().insert(self.index, cue);
        store.conform_window(self.index);
        store.editing_index = self.index;
        self.snapshot.after = Some(Snapshot::capture(store));

        Ok(CommandResult::new(&new_op_id())
            .with_change(StateChange::CueCreated {
                cue_id: cue_id.clone(),
                index: self.index,
            })
            .with_created_id(&cue_id))
    }

    fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
        self.snapshot.undo(store);
        Ok(())
    }

    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        self.snapshot.redo(store)
    }

    fn type_name(&self) -> &'static str {
        "AddCue"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

// =============================================================================
// DeleteCueCommand
// =============================================================================

/// Removes one cue; deleting the last cue leaves the default cue behind
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCueCommand {
    pub index: CueIndex,
    #[serde(skip)]
    snapshot: Snapshot,
}

impl DeleteCueCommand {
    pub fn new(index: CueIndex) -> Self {
        Self {
            index,
            snapshot: Snapshot::default(),
        }
    }
}

impl Command for DeleteCueCommand {
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        let cue_id = store.get_editable(self.index)?.id.clone();
        tracing::debug!(index = self.index, cue_id = %cue_id, "Deleting cue");

        self.snapshot.before = Some(Snapshot::capture(store));
        store.cues_mut().remove(self.index);

        let mut result = CommandResult::new(&new_op_id())
            .with_change(StateChange::CueDeleted {
                cue_id: cue_id.clone(),
            })
            .with_deleted_id(&cue_id);

        if store.is_empty() {
            store.ensure_not_empty();
            let fallback_id = store.cues()[0].id.clone();
            result = result
                .with_change(StateChange::CueCreated {
                    cue_id: fallback_id.clone(),
                    index: 0,
                })
                .with_created_id(&fallback_id);
        }

        let last = store.len() - 1;
        store.editing_index = store.editing_index.min(last);
        store.conform_window(self.index.min(last));
        self.snapshot.after = Some(Snapshot::capture(store));

        Ok(result)
    }

    fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
        self.snapshot.undo(store);
        Ok(())
    }

    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        self.snapshot.redo(store)
    }

    fn type_name(&self) -> &'static str {
        "DeleteCue"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "index": self.index })
    }
}

// =============================================================================
// SplitCueCommand
// =============================================================================

/// Splits a cue at its midpoint.
///
/// The first half keeps the text; the second half starts empty and inherits
/// category and style.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitCueCommand {
    pub index: CueIndex,
    #[serde(skip)]
    snapshot: Snapshot,
}

impl SplitCueCommand {
    pub fn new(index: CueIndex) -> Self {
        Self {
            index,
            snapshot: Snapshot::default(),
        }
    }
}

impl Command for SplitCueCommand {
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        let ctx = store.validation_context();
        let original = store.get(self.index)?.clone();
        if original.edit_disabled {
            return Err(CoreError::rejected(
                ErrorTag::SplitError,
                format!("Cue at index {} is not editable", self.index),
            ));
        }

        let midpoint = (original.start() + original.end()) / 2.0;
        let half = midpoint - original.start();
        if half < ctx.min_duration_sec() - TIME_EPSILON || !ctx.spec.duration_fits(half) {
            return Err(CoreError::rejected(
                ErrorTag::SplitError,
                format!(
                    "Halves of {:.3}s would be shorter than the {:.3}s minimum",
                    half,
                    ctx.min_duration_sec()
                ),
            ));
        }

        tracing::debug!(index = self.index, midpoint, "Splitting cue");
        self.snapshot.before = Some(Snapshot::capture(store));

        let mut first = original.clone();
        first.interval = TimeRange::new(original.start(), midpoint);
        first.refresh_token();

        let mut second = Cue::new(midpoint, original.end(), "").with_category(original.category);
        second.style = original.style;
        let second_id = second.id.clone();

        *store.cue_mut(self.index)? = first;
        store.cues_mut().insert(self.index + 1, second);
        store.conform_window(self.index);
        store.conform_window(self.index + 1);
        store.editing_index = self.index + 1;
        self.snapshot.after = Some(Snapshot::capture(store));

        Ok(CommandResult::new(&new_op_id())
            .with_change(StateChange::CueModified {
                cue_id: original.id.clone(),
                index: self.index,
            })
            .with_change(StateChange::CueCreated {
                cue_id: second_id.clone(),
                index: self.index + 1,
            })
            .with_created_id(&second_id))
    }

    fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
        self.snapshot.undo(store);
        Ok(())
    }

    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        self.snapshot.redo(store)
    }

    fn type_name(&self) -> &'static str {
        "SplitCue"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "index": self.index })
    }
}

// =============================================================================
// MergeCuesCommand
// =============================================================================

/// Merges the target cues of the selected display rows into one cue
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCuesCommand {
    /// Row indices as produced by the interval matcher
    pub rows: Vec<usize>,
    #[serde(skip)]
    snapshot: Snapshot,
}

impl MergeCuesCommand {
    pub fn new(rows: Vec<usize>) -> Self {
        Self {
            rows,
            snapshot: Snapshot::default(),
        }
    }

    fn reject(reason: impl Into<String>) -> CoreError {
        CoreError::rejected(ErrorTag::MergeError, reason)
    }

    /// Target cue indices behind the selected rows, ascending
    fn target_indices(&self, store: &CueStore) -> CoreResult<Vec<CueIndex>> {
        let lines = store.cue_lines();
        let mut indices = Vec::new();
        for &row in &self.rows {
            let line = lines
                .rows
                .get(row)
                .ok_or_else(|| Self::reject(format!("Row {row} does not exist")))?;
            indices.extend(line.target_indices());
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }

    fn merged_cue(cues: &[Cue]) -> Cue {
        let first = &cues[0];
        let mut merged = first.clone();
        let end = cues.iter().map(Cue::end).fold(first.end(), f64::max);
        merged.interval = TimeRange::new(first.start(), end);
        merged.text = cues
            .iter()
            .map(|c| c.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        merged.spell_check = None;

        for cue in &cues[1..] {
            merged.add_errors(&cue.errors);
            merged.comments.extend(cue.comments.iter().cloned());
            for glossary in &cue.glossary_matches {
                if !merged.glossary_matches.contains(glossary) {
                    merged.glossary_matches.push(glossary.clone());
                }
            }
        }
        merged.refresh_token();
        merged
    }
}

impl Command for MergeCuesCommand {
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        let indices = self.target_indices(store)?;
        if indices.len() < 2 {
            return Err(Self::reject("Select at least two cues to merge"));
        }
        if indices.windows(2).any(|pair| pair[1] != pair[0] + 1) {
            return Err(Self::reject("Only adjacent cues can be merged"));
        }

        let first = indices[0];
        let last = indices[indices.len() - 1];
        let selected = &store.cues()[first..=last];
        if let Some(offset) = selected.iter().position(|c| c.edit_disabled) {
            return Err(Self::reject(format!(
                "Cue at index {} is not editable",
                first + offset
            )));
        }

        let merged = Self::merged_cue(selected);
        if !store.spec.duration_fits(merged.duration()) {
            return Err(Self::reject(format!(
                "Merged duration {:.3}s is outside the allowed range",
                merged.duration()
            )));
        }

        tracing::debug!(first, last, "Merging cues");
        let deleted: Vec<String> = selected[1..].iter().map(|c| c.id.clone()).collect();
        let merged_id = merged.id.clone();
        let carried = merged.errors.clone();

        self.snapshot.before = Some(Snapshot::capture(store));
        let cues = store.cues_mut();
        cues.drain(first + 1..=last);
        cues[first] = merged;
        store.conform_window(first);
        store.cue_mut(first)?.add_errors(&carried);
        store.editing_index = first;
        self.snapshot.after = Some(Snapshot::capture(store));

        let mut result = CommandResult::new(&new_op_id()).with_change(StateChange::CueModified {
            cue_id: merged_id,
            index: first,
        });
        for cue_id in deleted {
            result = result
                .with_change(StateChange::CueDeleted {
                    cue_id: cue_id.clone(),
                })
                .with_deleted_id(&cue_id);
        }
        Ok(result)
    }

    fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
        self.snapshot.undo(store);
        Ok(())
    }

    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        self.snapshot.redo(store)
    }

    fn type_name(&self) -> &'static str {
        "MergeCues"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "rows": self.rows })
    }
}

// =============================================================================
// ShiftCuesCommand
// =============================================================================

/// Which cues a shift moves; indices are inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(tag = "type", content = "index", rename_all = "camelCase")]
pub enum ShiftScope {
    All,
    /// Cues `0..=index`
    Before(CueIndex),
    /// Cues `index..`
    After(CueIndex),
}

impl ShiftScope {
    fn range(&self, len: usize) -> CoreResult<std::ops::Range<CueIndex>> {
        match *self {
            ShiftScope::All => Ok(0..len),
            ShiftScope::Before(index) if index < len => Ok(0..index + 1),
            ShiftScope::After(index) if index < len => Ok(index..len),
            ShiftScope::Before(index) | ShiftScope::After(index) => {
                Err(CoreError::CueNotFound(index))
            }
        }
    }
}

/// Moves every editable cue in scope by `delta_sec`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftCuesCommand {
    pub delta_sec: TimeSec,
    pub scope: ShiftScope,
    #[serde(skip)]
    snapshot: Snapshot,
}

impl ShiftCuesCommand {
    pub fn new(delta_sec: TimeSec, scope: ShiftScope) -> Self {
        Self {
            delta_sec,
            scope,
            snapshot: Snapshot::default(),
        }
    }

    pub fn all(delta_sec: TimeSec) -> Self {
        Self::new(delta_sec, ShiftScope::All)
    }
}

impl Command for ShiftCuesCommand {
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        if !self.delta_sec.is_finite() {
            return Err(CoreError::ValidationError(
                "Shift amount must be finite".to_string(),
            ));
        }

        let range = self.scope.range(store.len())?;
        let movable: Vec<CueIndex> = range
            .filter(|&i| !store.cues()[i].edit_disabled)
            .collect();
        let (Some(&first), Some(&last)) = (movable.first(), movable.last()) else {
            return Ok(CommandResult::untouched(
                &new_op_id(),
                CommandOutcome::Unchanged,
            ));
        };
        if self.delta_sec.abs() <= TIME_EPSILON {
            return Ok(CommandResult::untouched(
                &new_op_id(),
                CommandOutcome::Unchanged,
            ));
        }
        let shifted_start = store.cues()[first].start() + self.delta_sec;
        let shifted_end = store.cues()[last].end() + self.delta_sec;

        if shifted_start < -TIME_EPSILON {
            return Err(CoreError::rejected(
                ErrorTag::InvalidRangeStart,
                format!("Shift would move cue {first} before 0s"),
            ));
        }
        if let Some(chunk) = store.track.media_chunk {
            if shifted_start < chunk.start_sec() - TIME_EPSILON
                || shifted_end > chunk.end_sec() + TIME_EPSILON
            {
                return Err(CoreError::rejected(
                    ErrorTag::OutOfChunkRange,
                    "Shift would move cues outside the media chunk",
                ));
            }
        }

        tracing::debug!(
            delta_sec = self.delta_sec,
            scope = ?self.scope,
            count = movable.len(),
            "Shifting cues"
        );

        self.snapshot.before = Some(Snapshot::capture(store));
        for &index in &movable {
            let cue = store.cue_mut(index)?;
            cue.interval = cue.interval.shifted(self.delta_sec);
            cue.refresh_token();
        }
        store.mark_all();
        self.snapshot.after = Some(Snapshot::capture(store));

        Ok(
            CommandResult::new(&new_op_id()).with_change(StateChange::CuesShifted {
                count: movable.len(),
                delta_sec: self.delta_sec,
            }),
        )
    }

    fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
        self.snapshot.undo(store);
        Ok(())
    }

    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        self.snapshot.redo(store)
    }

    fn type_name(&self) -> &'static str {
        "ShiftCues"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cues::{CueStyle, TrackMeta, VerticalPosition};
    use crate::core::validation::SubtitleSpecification;
    use crate::core::MediaChunk;

    fn store_with(intervals: &[(f64, f64, &str)]) -> CueStore {
        let mut store = CueStore::default();
        store.load_cues(
            intervals
                .iter()
                .map(|(start, end, text)| Cue::new(*start, *end, text))
                .collect(),
            vec![],
        );
        store
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn rejected_tag(err: CoreError) -> Option<ErrorTag> {
        assert!(err.is_validation_error(), "expected validation error: {err}");
        err.tag()
    }

    // -------------------------------------------------------------------------
    // UpdateCueCommand
    // -------------------------------------------------------------------------

    #[test]
    fn test_update_clamps_overlap_and_reports_tag() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (2.0, 4.0, "b")]);
        let old_token = store.cues()[0].edit_token.clone();

        let mut cmd = UpdateCueCommand::for_cue(&store, 0).unwrap().with_end(3.0);
        let result = cmd.execute(&mut store).unwrap();

        assert_eq!(result.outcome, CommandOutcome::Unchanged);
        assert_eq!(result.violations, vec![ErrorTag::TimeGapOverlap]);
        assert!(approx(store.cues()[0].end(), 2.0));
        assert_eq!(store.cues()[0].edit_token, old_token);
    }

    #[test]
    fn test_update_commits_and_refreshes_token() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (4.0, 5.0, "b")]);
        let old_token = store.cues()[0].edit_token.clone();

        let mut cmd = UpdateCueCommand::new(0, &old_token)
            .with_end(3.0)
            .with_text("edited");
        let result = cmd.execute(&mut store).unwrap();

        assert!(result.is_applied());
        assert!(approx(store.cues()[0].end(), 3.0));
        assert_eq!(store.cues()[0].text, "edited");
        assert_ne!(store.cues()[0].edit_token, old_token);
    }

    #[test]
    fn test_update_with_stale_token_is_discarded() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        let mut cmd = UpdateCueCommand::new(0, "stale").with_text("late");
        let result = cmd.execute(&mut store).unwrap();

        assert_eq!(result.outcome, CommandOutcome::Discarded);
        assert_eq!(store.cues()[0].text, "a");
    }

    #[test]
    fn test_second_edit_with_same_token_is_discarded() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        let token = store.cues()[0].edit_token.clone();

        UpdateCueCommand::new(0, &token)
            .with_text("first")
            .execute(&mut store)
            .unwrap();
        let second = UpdateCueCommand::new(0, &token)
            .with_text("second")
            .execute(&mut store)
            .unwrap();

        assert_eq!(second.outcome, CommandOutcome::Discarded);
        assert_eq!(store.cues()[0].text, "first");
    }

    #[test]
    fn test_update_rejects_disabled_cue() {
        let mut store = CueStore::default();
        store.load_cues(vec![Cue::new(0.0, 2.0, "a").disabled()], vec![]);
        let token = store.cues()[0].edit_token.clone();
        let err = UpdateCueCommand::new(0, &token)
            .with_text("x")
            .execute(&mut store)
            .unwrap_err();
        assert!(matches!(err, CoreError::CueEditDisabled(0)));
    }

    #[test]
    fn test_update_undo_redo() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        let mut cmd = UpdateCueCommand::for_cue(&store, 0)
            .unwrap()
            .with_text("b");
        cmd.execute(&mut store).unwrap();

        cmd.undo(&mut store).unwrap();
        assert_eq!(store.cues()[0].text, "a");

        cmd.redo(&mut store).unwrap();
        assert_eq!(store.cues()[0].text, "b");
    }

    #[test]
    fn test_update_rechecks_neighbours() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (1.0, 3.0, "b"), (3.0, 4.0, "c")]);
        assert!(store.cues()[0].corrupted);
        assert!(store.cues()[1].corrupted);

        // Moving b's start out of the overlap clears both flags
        UpdateCueCommand::for_cue(&store, 1)
            .unwrap()
            .with_start(2.0)
            .execute(&mut store)
            .unwrap();
        assert!(!store.cues()[0].corrupted);
        assert!(!store.cues()[1].corrupted);
    }

    #[test]
    fn test_update_moving_both_edges_keeps_track_ordered() {
        let mut store = store_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (3.0, 4.0, "c")]);
        let result = UpdateCueCommand::for_cue(&store, 1)
            .unwrap()
            .with_start(20.0)
            .with_end(21.0)
            .execute(&mut store)
            .unwrap();

        assert_eq!(result.outcome, CommandOutcome::Applied);
        let edited = &store.cues()[1];
        assert!(approx(edited.start(), 2.5));
        assert!(approx(edited.end(), 3.0));
        assert!(!edited.corrupted);
        // The correction is still reported on the cue after the re-check
        assert_eq!(edited.errors, vec![ErrorTag::TimeGapOverlap]);
        assert!(store
            .cues()
            .windows(2)
            .all(|pair| pair[0].end() <= pair[1].start()));
    }

    #[test]
    fn test_update_recheck_records_neighbour_errors() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (1.0, 3.0, "b")]);
        assert_eq!(store.cues()[0].errors, vec![ErrorTag::TimeGapOverlap]);

        UpdateCueCommand::for_cue(&store, 1)
            .unwrap()
            .with_start(2.0)
            .execute(&mut store)
            .unwrap();
        assert!(store.cues()[0].errors.is_empty());
        assert!(store.cues()[1].errors.is_empty());
    }

    // -------------------------------------------------------------------------
    // AddCueCommand
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_after_last_uses_default_step() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        AddCueCommand::new(1).execute(&mut store).unwrap();

        assert_eq!(store.len(), 2);
        assert!(approx(store.cues()[1].start(), 2.0));
        assert!(approx(store.cues()[1].end(), 5.0));
        assert_eq!(store.editing_index, 1);
    }

    #[test]
    fn test_add_step_capped_by_max_duration() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        store.spec = SubtitleSpecification::enabled().with_max_duration_ms(1500);
        AddCueCommand::new(1).execute(&mut store).unwrap();
        assert!(approx(store.cues()[1].duration(), 1.5));
    }

    #[test]
    fn test_add_uses_source_interval_when_clear_of_previous() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        AddCueCommand::new(1)
            .with_source_interval(TimeRange::new(2.5, 4.0))
            .execute(&mut store)
            .unwrap();
        assert!(approx(store.cues()[1].start(), 2.5));
        assert!(approx(store.cues()[1].end(), 4.0));

        let mut store = store_with(&[(0.0, 2.0, "a")]);
        AddCueCommand::new(1)
            .with_source_interval(TimeRange::new(1.0, 4.0))
            .execute(&mut store)
            .unwrap();
        assert!(approx(store.cues()[1].start(), 2.0));
    }

    #[test]
    fn test_add_between_cues_clamps_to_next() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (3.0, 4.0, "c")]);
        AddCueCommand::new(1).execute(&mut store).unwrap();
        assert!(approx(store.cues()[1].start(), 2.0));
        assert!(approx(store.cues()[1].end(), 3.0));
        assert_eq!(store.cues()[2].text, "c");
    }

    #[test]
    fn test_add_inherits_category() {
        let mut store = CueStore::default();
        store.load_cues(
            vec![Cue::new(0.0, 1.0, "♪").with_category(CueCategory::Lyrics)],
            vec![],
        );
        AddCueCommand::new(1).execute(&mut store).unwrap();
        assert_eq!(store.cues()[1].category, CueCategory::Lyrics);
    }

    #[test]
    fn test_add_without_room_is_rejected() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (2.0, 4.0, "b")]);
        let before = store.cues().to_vec();
        let err = AddCueCommand::new(1).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::InvalidRangeEnd));
        assert_eq!(store.cues(), before.as_slice());
    }

    #[test]
    fn test_add_below_minimum_is_rejected() {
        let mut store = store_with(&[(0.0, 2.0, "a"), (2.5, 4.0, "b")]);
        store.spec = SubtitleSpecification::enabled().with_min_duration_ms(1000);
        let err = AddCueCommand::new(1).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::InvalidRangeEnd));
        assert_eq!(store.len(), 2);
    }

    // -------------------------------------------------------------------------
    // DeleteCueCommand
    // -------------------------------------------------------------------------

    #[test]
    fn test_delete_only_cue_resets_to_default() {
        let mut store = store_with(&[(5.0, 6.0, "only")]);
        let result = DeleteCueCommand::new(0).execute(&mut store).unwrap();

        assert_eq!(store.len(), 1);
        assert!(approx(store.cues()[0].start(), 0.0));
        assert!(approx(store.cues()[0].end(), 3.0));
        assert!(store.cues()[0].text.is_empty());
        assert_eq!(store.cues()[0].category, CueCategory::Dialogue);
        assert_eq!(result.created_ids.len(), 1);
    }

    #[test]
    fn test_delete_and_undo() {
        let mut store = store_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        let mut cmd = DeleteCueCommand::new(0);
        cmd.execute(&mut store).unwrap();
        assert_eq!(store.cues()[0].text, "b");

        cmd.undo(&mut store).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.cues()[0].text, "a");
    }

    #[test]
    fn test_delete_disabled_cue_fails() {
        let mut store = CueStore::default();
        store.load_cues(
            vec![Cue::new(0.0, 1.0, "a").disabled(), Cue::new(1.0, 2.0, "b")],
            vec![],
        );
        assert!(matches!(
            DeleteCueCommand::new(0).execute(&mut store),
            Err(CoreError::CueEditDisabled(0))
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut store = store_with(&[(0.0, 1.0, "a")]);
        assert!(matches!(
            DeleteCueCommand::new(3).execute(&mut store),
            Err(CoreError::CueNotFound(3))
        ));
    }

    // -------------------------------------------------------------------------
    // SplitCueCommand
    // -------------------------------------------------------------------------

    #[test]
    fn test_split_at_midpoint() {
        let mut store = CueStore::default();
        let style = CueStyle {
            vertical: VerticalPosition::Top,
            ..Default::default()
        };
        store.load_cues(
            vec![Cue::new(0.0, 4.0, "hello")
                .with_category(CueCategory::OnScreenText)
                .with_style(style)],
            vec![],
        );

        SplitCueCommand::new(0).execute(&mut store).unwrap();

        assert_eq!(store.len(), 2);
        let (first, second) = (&store.cues()[0], &store.cues()[1]);
        assert!(approx(first.end(), 2.0));
        assert_eq!(first.text, "hello");
        assert!(approx(second.start(), 2.0));
        assert!(approx(second.end(), 4.0));
        assert!(second.text.is_empty());
        assert_eq!(second.category, CueCategory::OnScreenText);
        assert_eq!(second.style, Some(style));
    }

    #[test]
    fn test_split_below_minimum_is_rejected() {
        let mut store = store_with(&[(0.0, 2.0, "a")]);
        store.spec = SubtitleSpecification::enabled().with_min_duration_ms(1200);
        let err = SplitCueCommand::new(0).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::SplitError));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_split_disabled_cue_is_rejected() {
        let mut store = CueStore::default();
        store.load_cues(vec![Cue::new(0.0, 4.0, "a").disabled()], vec![]);
        let err = SplitCueCommand::new(0).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::SplitError));
    }

    #[test]
    fn test_split_undo_redo() {
        let mut store = store_with(&[(0.0, 4.0, "a")]);
        let mut cmd = SplitCueCommand::new(0);
        cmd.execute(&mut store).unwrap();
        cmd.undo(&mut store).unwrap();
        assert_eq!(store.len(), 1);
        assert!(approx(store.cues()[0].end(), 4.0));
        cmd.redo(&mut store).unwrap();
        assert_eq!(store.len(), 2);
    }

    // -------------------------------------------------------------------------
    // MergeCuesCommand
    // -------------------------------------------------------------------------

    #[test]
    fn test_merge_two_rows() {
        let mut store = store_with(&[(0.0, 1.0, "Line A"), (1.0, 2.0, "Line B")]);
        store.cue_mut(1).unwrap().errors.push(ErrorTag::TimeGapOverlap);

        let result = MergeCuesCommand::new(vec![0, 1])
            .execute(&mut store)
            .unwrap();

        assert_eq!(store.len(), 1);
        let merged = &store.cues()[0];
        assert!(approx(merged.start(), 0.0));
        assert!(approx(merged.end(), 2.0));
        assert_eq!(merged.text, "Line A\nLine B");
        assert_eq!(merged.errors, vec![ErrorTag::TimeGapOverlap]);
        assert_eq!(result.deleted_ids.len(), 1);
    }

    #[test]
    fn test_merge_needs_two_cues() {
        let mut store = store_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        let err = MergeCuesCommand::new(vec![1]).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::MergeError));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_merge_rejects_gaps_in_selection() {
        let mut store = store_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (2.0, 3.0, "c")]);
        let err = MergeCuesCommand::new(vec![0, 2])
            .execute(&mut store)
            .unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::MergeError));
    }

    #[test]
    fn test_merge_rejects_span_over_maximum() {
        let mut store = store_with(&[(0.0, 3.0, "a"), (3.0, 6.0, "b")]);
        store.spec = SubtitleSpecification::enabled().with_max_duration_ms(5000);
        let err = MergeCuesCommand::new(vec![0, 1])
            .execute(&mut store)
            .unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::MergeError));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_merge_rows_of_translation() {
        let mut store = CueStore::new(TrackMeta::translation("fr"), Default::default());
        store.load_cues(
            vec![
                Cue::new(0.0, 1.0, "un"),
                Cue::new(1.0, 2.0, "deux"),
                Cue::new(2.0, 3.0, "trois"),
            ],
            vec![Cue::new(0.0, 2.0, "one two"), Cue::new(2.0, 3.0, "three")],
        );
        // Row 0 holds "un" and "deux" against "one two"
        let rows = store.cue_lines().rows.len();
        assert_eq!(rows, 2);

        MergeCuesCommand::new(vec![0]).execute(&mut store).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.cues()[0].text, "un\ndeux");
    }

    // -------------------------------------------------------------------------
    // ShiftCuesCommand
    // -------------------------------------------------------------------------

    #[test]
    fn test_shift_all_skips_disabled() {
        let mut store = CueStore::default();
        store.load_cues(
            vec![
                Cue::new(0.0, 1.0, "fixed").disabled(),
                Cue::new(2.0, 3.0, "a"),
                Cue::new(3.0, 4.0, "b"),
            ],
            vec![],
        );
        let result = ShiftCuesCommand::all(1.5).execute(&mut store).unwrap();

        assert!(approx(store.cues()[0].start(), 0.0));
        assert!(approx(store.cues()[1].start(), 3.5));
        assert!(approx(store.cues()[2].end(), 5.5));
        assert_eq!(
            result.changes,
            vec![StateChange::CuesShifted {
                count: 2,
                delta_sec: 1.5
            }]
        );
    }

    #[test]
    fn test_shift_before_and_after_are_inclusive() {
        let mut store = store_with(&[(1.0, 2.0, "a"), (3.0, 4.0, "b"), (5.0, 6.0, "c")]);
        ShiftCuesCommand::new(-0.5, ShiftScope::Before(1))
            .execute(&mut store)
            .unwrap();
        assert!(approx(store.cues()[0].start(), 0.5));
        assert!(approx(store.cues()[1].start(), 2.5));
        assert!(approx(store.cues()[2].start(), 5.0));

        ShiftCuesCommand::new(1.0, ShiftScope::After(1))
            .execute(&mut store)
            .unwrap();
        assert!(approx(store.cues()[0].start(), 0.5));
        assert!(approx(store.cues()[1].start(), 3.5));
        assert!(approx(store.cues()[2].start(), 6.0));
    }

    #[test]
    fn test_shift_outside_chunk_is_rejected() {
        let mut store = CueStore::new(
            TrackMeta::caption("en").with_media_chunk(MediaChunk::new(0, 5000)),
            Default::default(),
        );
        store.load_cues(
            vec![Cue::new(1.0, 2.0, "a"), Cue::new(3.0, 4.0, "b")],
            vec![],
        );
        let before = store.cues().to_vec();
        let err = ShiftCuesCommand::all(1.5).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::OutOfChunkRange));
        assert_eq!(store.cues(), before.as_slice());
    }

    #[test]
    fn test_shift_before_zero_is_rejected() {
        let mut store = store_with(&[(0.5, 1.0, "a")]);
        let err = ShiftCuesCommand::all(-1.0).execute(&mut store).unwrap_err();
        assert_eq!(rejected_tag(err), Some(ErrorTag::InvalidRangeStart));
    }

    #[test]
    fn test_shift_zero_is_unchanged() {
        let mut store = store_with(&[(0.5, 1.0, "a")]);
        let result = ShiftCuesCommand::all(0.0).execute(&mut store).unwrap();
        assert_eq!(result.outcome, CommandOutcome::Unchanged);
    }

    #[test]
    fn test_shift_scope_out_of_range() {
        let mut store = store_with(&[(0.5, 1.0, "a")]);
        assert!(matches!(
            ShiftCuesCommand::new(1.0, ShiftScope::After(4)).execute(&mut store),
            Err(CoreError::CueNotFound(4))
        ));
    }

    #[test]
    fn test_shift_scope_serialization() {
        let json = serde_json::to_string(&ShiftScope::Before(3)).unwrap();
        assert_eq!(json, r#"{"type":"before","index":3}"#);
    }
}
