//! Cuesync Core
//!
//! UI-free entry point to the cue engine. Re-exports the engine modules and
//! adds an event bus so hosts can react to store changes without polling.

pub mod events;
pub mod session;

pub use cuesync_lib::core::{
    commands, cues, fs, matching, settings, validation, CoreError, CoreResult, CueId, CueIndex,
    EditToken, MediaChunk, TimeMs, TimeRange, TimeSec,
};
pub use cuesync_lib::EditingSession;

pub use events::{CueEvent, CueEventBus, DEFAULT_EVENT_CAPACITY};
pub use session::SessionHandle;
