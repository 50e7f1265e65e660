//! Cuesync Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::validation::ErrorTag;
use super::{CueIndex, TimeSec};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Cue Errors
    // =========================================================================
    #[error("Cue not found at index {0}")]
    CueNotFound(CueIndex),

    #[error("Cue at index {0} is not editable")]
    CueEditDisabled(CueIndex),

    #[error("Invalid time range: {0}~{1} seconds")]
    InvalidTimeRange(TimeSec, TimeSec),

    /// Structural operation refused; the cue store was left untouched
    #[error("Operation rejected ({tag}): {reason}")]
    Rejected { tag: ErrorTag, reason: String },

    // =========================================================================
    // Command Errors
    // =========================================================================
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    // =========================================================================
    // Track IO Errors
    // =========================================================================
    #[error("Subtitle parse error: {0}")]
    Parse(#[from] crate::core::cues::ParseError),

    #[error("Unsupported track format: {0}")]
    UnsupportedFormat(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Builds a structural rejection carrying its error tag
    pub fn rejected(tag: ErrorTag, reason: impl Into<String>) -> Self {
        Self::Rejected {
            tag,
            reason: reason.into(),
        }
    }

    /// Whether this error should raise the editor's "validation error" signal
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. } | Self::InvalidTimeRange(..) | Self::ValidationError(_)
        )
    }

    /// Tag attached to a rejection, if any
    pub fn tag(&self) -> Option<ErrorTag> {
        match self {
            Self::Rejected { tag, .. } => Some(*tag),
            _ => None,
        }
    }
}
