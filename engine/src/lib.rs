//! Cuesync Core Library
//!
//! Cue synchronization and constraint validation for subtitle editors.
//! This library contains the cue store, the interval matcher, the timing
//! validator and the undoable command layer.
//!
//! ## TypeScript Bindings
//!
//! Wire types derive `specta::Type`, so a host UI can export them to
//! TypeScript.

pub mod core;

use std::path::{Path, PathBuf};

use crate::core::{
    commands::{Command, CommandExecutor, CommandResult},
    cues::{CueStore, TrackDocument, TrackFormat, TrackKind, TrackMeta},
    settings::SyncSettings,
    validation::SubtitleSpecification,
    CoreResult,
};

// =============================================================================
// Editing Session
// =============================================================================

/// One open track: the cue store, its undo history and where it is saved
pub struct EditingSession {
    /// Track file path
    pub path: PathBuf,
    /// Cue lists and validation settings (in-memory)
    pub store: CueStore,
    /// Command executor with undo/redo
    pub executor: CommandExecutor,
}

impl EditingSession {
    /// Creates a session holding the default cue, written to `path` on first save
    pub fn create(path: PathBuf, language: &str, settings: &SyncSettings) -> Self {
        let store = CueStore::new(settings.track_meta(language), settings.spec);
        Self::with_store(path, store, settings)
    }

    /// Opens a track file (SRT, VTT or JSON document).
    ///
    /// Subtitle files carry no track settings, so overlap and the specification
    /// come from `settings`. A JSON document keeps its own, falling back to
    /// `settings.spec` when it has none.
    pub fn open(path: PathBuf, settings: &SyncSettings) -> CoreResult<Self> {
        let mut document = TrackDocument::load(&path)?;

        if TrackFormat::from_path(&path) != Some(TrackFormat::Json) {
            document.track.overlap_enabled = settings.track.overlap_enabled;
        }
        if document.spec == SubtitleSpecification::default() {
            document.spec = settings.spec;
        }

        let store = CueStore::from_document(document);
        Ok(Self::with_store(path, store, settings))
    }

    /// Opens `path` as a translation of the cues in `source_path`
    pub fn open_translation(
        path: PathBuf,
        source_path: &Path,
        settings: &SyncSettings,
    ) -> CoreResult<Self> {
        let mut session = Self::open(path, settings)?;
        let source = TrackDocument::load(source_path)?;

        let mut document = session.store.to_document().with_source_cues(source.cues);
        document.track.kind = TrackKind::Translation;
        session.store = CueStore::from_document(document).with_editing_defaults(
            settings.editing.default_step_ms,
            settings.editing.min_duration_floor_ms,
        );

        tracing::info!(
            path = %session.path.display(),
            source = %source_path.display(),
            source_cues = session.store.source_cues().len(),
            "Opened translation session"
        );
        Ok(session)
    }

    fn with_store(path: PathBuf, store: CueStore, settings: &SyncSettings) -> Self {
        Self {
            path,
            store: store.with_editing_defaults(
                settings.editing.default_step_ms,
                settings.editing.min_duration_floor_ms,
            ),
            executor: CommandExecutor::new().with_max_history(settings.editing.max_history),
        }
    }

    pub fn track(&self) -> &TrackMeta {
        &self.store.track
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty
    }

    /// Executes a command against the store and records it for undo
    pub fn execute(&mut self, command: Box<dyn Command>) -> CoreResult<CommandResult> {
        self.executor.execute(command, &mut self.store)
    }

    pub fn undo(&mut self) -> CoreResult<()> {
        self.executor.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> CoreResult<CommandResult> {
        self.executor.redo(&mut self.store)
    }

    /// Saves the track to its path
    ///
    /// After a successful save, the `is_dirty` flag is reset to `false`.
    pub fn save(&mut self) -> CoreResult<()> {
        self.store.to_document().save(&self.path)?;
        self.store.is_dirty = false;
        tracing::debug!(path = %self.path.display(), "Track saved, is_dirty reset to false");
        Ok(())
    }

    /// Saves to a new path, which becomes the session's path
    pub fn save_as(&mut self, path: PathBuf) -> CoreResult<()> {
        self.path = path;
        self.save()
    }
}

// =============================================================================
// Tests
// =============================================================================
