//! Cue Store
//!
//! Owns the target and source cue lists of one editing session together with
//! the track metadata and subtitle specification that validation consults.
//! Commands mutate the store; nothing here saves on its own.

use std::path::Path;

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{debug, info};

use super::formats::{export_srt, export_vtt, parse_srt, parse_vtt, TrackFormat};
use super::{Cue, TrackMeta};
use crate::core::fs::atomic_write_bytes;
use crate::core::matching::{index_at_time, match_cue_lines, MatchedCues};
use crate::core::validation::{
    conform_window, mark_cues, SubtitleSpecification, ValidationContext,
    DEFAULT_MIN_DURATION_FLOOR_MS,
};
use crate::core::{CoreError, CoreResult, CueIndex, TimeMs, TimeSec};

/// Duration of a cue added without a source interval, before spec limits
pub const DEFAULT_STEP_MS: TimeMs = 3000;

// =============================================================================
// Track Document
// =============================================================================

/// Serialized form of a whole editing session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct TrackDocument {
    #[serde(default)]
    pub track: TrackMeta,
    #[serde(default)]
    pub cues: Vec<Cue>,
    #[serde(default)]
    pub source_cues: Vec<Cue>,
    #[serde(default)]
    pub spec: SubtitleSpecification,
}

impl TrackDocument {
    /// Loads a track from SRT, VTT or JSON, picking the format from the extension
    pub fn load(path: &Path) -> CoreResult<Self> {
        let format = TrackFormat::from_path(path)
            .ok_or_else(|| CoreError::UnsupportedFormat(path.display().to_string()))?;
        let content = std::fs::read_to_string(path)?;

        let document = match format {
            TrackFormat::Json => serde_json::from_str(&content)?,
            TrackFormat::Srt => Self::from_cues(parse_srt(&content)?),
            TrackFormat::Vtt => Self::from_cues(parse_vtt(&content)?),
        };

        info!(
            path = %path.display(),
            cues = document.cues.len(),
            source_cues = document.source_cues.len(),
            "Loaded track"
        );
        Ok(document)
    }

    /// Writes the target cues (SRT/VTT) or the whole document (JSON)
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let format = TrackFormat::from_path(path)
            .ok_or_else(|| CoreError::UnsupportedFormat(path.display().to_string()))?;

        let bytes = match format {
            TrackFormat::Json => serde_json::to_vec_pretty(self)?,
            TrackFormat::Srt => export_srt(&self.cues).into_bytes(),
            TrackFormat::Vtt => export_vtt(&self.cues).into_bytes(),
        };
        atomic_write_bytes(path, &bytes)?;

        info!(path = %path.display(), cues = self.cues.len(), "Saved track");
        Ok(())
    }

    /// A caption document around imported cues
    pub fn from_cues(cues: Vec<Cue>) -> Self {
        Self {
            cues,
            ..Default::default()
        }
    }

    pub fn with_source_cues(mut self, source_cues: Vec<Cue>) -> Self {
        self.source_cues = source_cues;
        self
    }
}

// =============================================================================
// Cue Store
// =============================================================================

/// Live cue lists of an editing session
#[derive(Clone, Debug)]
pub struct CueStore {
    pub track: TrackMeta,
    pub spec: SubtitleSpecification,
    /// Target cue currently focused in the editor
    pub editing_index: CueIndex,
    /// Duration of cues added without a source interval
    pub default_step_ms: TimeMs,
    pub min_duration_floor_ms: TimeMs,
    /// Set by every committed mutation; cleared by whoever persists
    pub is_dirty: bool,
    cues: Vec<Cue>,
    source_cues: Vec<Cue>,
}

impl Default for CueStore {
    fn default() -> Self {
        Self::new(TrackMeta::default(), SubtitleSpecification::default())
    }
}

impl CueStore {
    /// Creates a store holding the single default cue
    pub fn new(track: TrackMeta, spec: SubtitleSpecification) -> Self {
        Self {
            track,
            spec,
            editing_index: 0,
            default_step_ms: DEFAULT_STEP_MS,
            min_duration_floor_ms: DEFAULT_MIN_DURATION_FLOOR_MS,
            is_dirty: false,
            cues: vec![Cue::default_empty()],
            source_cues: Vec::new(),
        }
    }

    /// Builds a store from a document and flags corrupted cues
    pub fn from_document(document: TrackDocument) -> Self {
        let mut store = Self::new(document.track, document.spec);
        store.load_cues(document.cues, document.source_cues);
        store
    }

    pub fn to_document(&self) -> TrackDocument {
        TrackDocument {
            track: self.track.clone(),
            cues: self.cues.clone(),
            source_cues: self.source_cues.clone(),
            spec: self.spec,
        }
    }

    pub fn with_editing_defaults(mut self, default_step_ms: TimeMs, floor_ms: TimeMs) -> Self {
        self.default_step_ms = default_step_ms;
        self.min_duration_floor_ms = floor_ms;
        self
    }

    /// Replaces both cue lists, sorting them by start time and flagging
    /// corrupted cues. Timings are left as loaded.
    pub fn load_cues(&mut self, mut cues: Vec<Cue>, mut source_cues: Vec<Cue>) {
        cues.sort_by(|a, b| a.start().total_cmp(&b.start()));
        source_cues.sort_by(|a, b| a.start().total_cmp(&b.start()));
        self.cues = cues;
        self.source_cues = source_cues;
        self.ensure_not_empty();
        self.editing_index = self.editing_index.min(self.cues.len() - 1);
        self.mark_all();
        debug!(
            cues = self.cues.len(),
            source_cues = self.source_cues.len(),
            corrupted = self.cues.iter().filter(|c| c.corrupted).count(),
            "Loaded cues into store"
        );
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn source_cues(&self) -> &[Cue] {
        &self.source_cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Always false once constructed; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: CueIndex) -> CoreResult<&Cue> {
        self.cues.get(index).ok_or(CoreError::CueNotFound(index))
    }

    /// Cue at `index`, rejecting immutable cues
    pub fn get_editable(&self, index: CueIndex) -> CoreResult<&Cue> {
        let cue = self.get(index)?;
        if cue.edit_disabled {
            return Err(CoreError::CueEditDisabled(index));
        }
        Ok(cue)
    }

    /// Previous and next cue around `index`
    pub fn neighbors(&self, index: CueIndex) -> (Option<&Cue>, Option<&Cue>) {
        let previous = index.checked_sub(1).and_then(|i| self.cues.get(i));
        (previous, self.cues.get(index + 1))
    }

    pub fn is_translation(&self) -> bool {
        !self.source_cues.is_empty()
    }

    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            spec: self.spec,
            overlap_allowed: self.track.overlap_enabled,
            media_chunk: self.track.media_chunk,
            min_duration_floor_ms: self.min_duration_floor_ms,
        }
    }

    /// Target/source rows for display
    pub fn cue_lines(&self) -> MatchedCues<'_> {
        match_cue_lines(&self.cues, &self.source_cues, self.editing_index)
    }

    pub fn index_at_time(&self, time_sec: TimeSec) -> CueIndex {
        index_at_time(&self.cues, time_sec)
    }

    pub fn set_editing_index(&mut self, index: CueIndex) -> CoreResult<()> {
        self.get(index)?;
        self.editing_index = index;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Mutation (crate-internal; commands are the public write path)
    // -------------------------------------------------------------------------

    pub(crate) fn cues_mut(&mut self) -> &mut Vec<Cue> {
        &mut self.cues
    }

    pub(crate) fn cue_mut(&mut self, index: CueIndex) -> CoreResult<&mut Cue> {
        self.cues.get_mut(index).ok_or(CoreError::CueNotFound(index))
    }

    /// Swaps in a previously captured cue list (undo/redo). Tokens are
    /// reissued so edits captured before the swap are dropped.
    pub(crate) fn restore_cues(&mut self, mut cues: Vec<Cue>) {
        cues.iter_mut().for_each(Cue::refresh_token);
        self.cues = cues;
        self.ensure_not_empty();
        self.editing_index = self.editing_index.min(self.cues.len() - 1);
        self.mark_all();
        self.is_dirty = true;
    }

    /// Re-flags the cues at `index - 1 ..= index + 1`
    pub(crate) fn conform_window(&mut self, index: CueIndex) {
        let ctx = self.validation_context();
        conform_window(&mut self.cues, index, &ctx);
    }

    /// Re-flags every cue
    pub fn mark_all(&mut self) {
        let ctx = self.validation_context();
        mark_cues(&mut self.cues, &ctx);
    }

    /// The store never holds zero cues
    pub(crate) fn ensure_not_empty(&mut self) {
        if self.cues.is_empty() {
            self.cues.push(Cue::default_empty());
            self.editing_index = 0;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
