//! Cue Module
//!
//! Cue and track models, the session cue store, and subtitle file formats.

mod formats;
pub mod markup;
mod models;
mod store;

pub use formats::{export_srt, export_vtt, parse_srt, parse_vtt, ParseError, TrackFormat};
pub use models::*;
pub use store::{CueStore, TrackDocument, DEFAULT_STEP_MS};
