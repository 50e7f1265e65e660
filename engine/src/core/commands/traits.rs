//! Command Trait Definition
//!
//! Defines the trait that all cue commands must implement.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::{cues::CueStore, validation::ErrorTag, CoreResult, CueId, CueIndex, OpId};

/// Whether a command changed the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum CommandOutcome {
    /// The store changed; the command is recorded in history
    #[default]
    Applied,
    /// The corrected result equals the current cue; nothing recorded
    Unchanged,
    /// The captured edit token no longer matches; the edit was dropped
    Discarded,
}

/// Command execution result
#[derive(Debug, Clone, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Generated Operation ID
    pub op_id: OpId,

    pub outcome: CommandOutcome,

    /// List of state changes
    pub changes: Vec<StateChange>,

    /// Tags of rules that corrected the input
    pub violations: Vec<ErrorTag>,

    /// Newly created cue IDs
    pub created_ids: Vec<CueId>,

    /// Deleted cue IDs
    pub deleted_ids: Vec<CueId>,
}

impl CommandResult {
    /// Creates a new empty command result with the given operation ID
    pub fn new(op_id: &str) -> Self {
        Self {
            op_id: op_id.to_string(),
            outcome: CommandOutcome::Applied,
            changes: vec![],
            violations: vec![],
            created_ids: vec![],
            deleted_ids: vec![],
        }
    }

    /// Result of a command that left the store untouched
    pub fn untouched(op_id: &str, outcome: CommandOutcome) -> Self {
        Self {
            outcome,
            ..Self::new(op_id)
        }
    }

    /// Adds a state change
    pub fn with_change(mut self, change: StateChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn with_violations(mut self, violations: Vec<ErrorTag>) -> Self {
        self.violations = violations;
        self
    }

    /// Adds a created ID
    pub fn with_created_id(mut self, id: &str) -> Self {
        self.created_ids.push(id.to_string());
        self
    }

    /// Adds a deleted ID
    pub fn with_deleted_id(mut self, id: &str) -> Self {
        self.deleted_ids.push(id.to_string());
        self
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == CommandOutcome::Applied
    }
}

/// State change types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateChange {
    #[serde(rename_all = "camelCase")]
    CueCreated { cue_id: CueId, index: CueIndex },
    #[serde(rename_all = "camelCase")]
    CueModified { cue_id: CueId, index: CueIndex },
    #[serde(rename_all = "camelCase")]
    CueDeleted { cue_id: CueId },
    #[serde(rename_all = "camelCase")]
    CuesShifted { count: usize, delta_sec: f64 },
    /// Whole cue list replaced (undo/redo, reload)
    CuesRestored,
}

/// Trait that all cue commands must implement
///
/// # Core Principles
/// - All cue mutations go through Commands.
/// - All Commands must be undoable.
/// - A failed command leaves the store unchanged.
///
/// # Example
/// ```rust,ignore
/// pub struct SplitCueCommand {
///     pub index: CueIndex,
/// }
///
/// impl Command for SplitCueCommand {
///     fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
///         // Split logic
///     }
///
///     fn undo(&self, store: &mut CueStore) -> CoreResult<()> {
///         // Restore the captured cues
///     }
///
///     fn type_name(&self) -> &'static str {
///         "SplitCue"
///     }
///
///     fn to_json(&self) -> serde_json::Value {
///         serde_json::json!({ "index": self.index })
///     }
/// }
/// ```
pub trait Command: Send + Sync {
    /// Execute the command
    ///
    /// On failure, the store must remain unchanged.
    /// Uses &mut self to allow storing undo state during execution.
    fn execute(&mut self, store: &mut CueStore) -> CoreResult<CommandResult>;

    /// Undo the command
    ///
    /// Only called after execute succeeds.
    fn undo(&self, store: &mut CueStore) -> CoreResult<()>;

    /// Redo the command
    ///
    /// Default implementation is identical to execute.
    fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        self.execute(store)
    }

    /// Command type name, used for logging and debugging
    fn type_name(&self) -> &'static str;

    /// JSON description of the command's parameters
    fn to_json(&self) -> serde_json::Value;
}
