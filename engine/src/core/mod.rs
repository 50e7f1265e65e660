//! Cuesync Core Engine
//!
//! Cue storage, timing validation, interval matching and the undoable
//! command layer that ties them together.

pub mod commands;
pub mod cues;
pub mod fs;
pub mod matching;
pub mod settings;
pub mod validation;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_destructive;
