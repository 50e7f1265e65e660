//! Edit Command System
//!
//! Every cue mutation is performed through a Command so it can be undone.
//! The executor records applied commands and replays them for undo/redo.

mod cue;
mod executor;
mod traits;

pub use cue::*;
pub use executor::*;
pub use traits::*;
