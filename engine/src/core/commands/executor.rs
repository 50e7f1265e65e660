//! Command Executor Module
//!
//! Handles command execution and undo/redo history.
//! This is the central hub for all cue-changing operations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::core::{
    commands::{Command, CommandResult},
    cues::CueStore,
    CoreError, CoreResult, OpId,
};

/// Default number of undoable commands kept
pub const DEFAULT_MAX_HISTORY: usize = 100;

// =============================================================================
// History Entry
// =============================================================================

/// Entry in the undo/redo history
pub struct HistoryEntry {
    /// Operation ID
    pub op_id: OpId,
    /// Command that was executed. Locked only so `undo(&self)` and
    /// `redo(&mut self)` can both reach it through the shared entry.
    pub command: Arc<Mutex<Box<dyn Command>>>,
    /// Result from command execution
    pub result: CommandResult,
    /// Timestamp when command was executed
    pub timestamp: String,
}

impl std::fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("op_id", &self.op_id)
            .field("result", &self.result)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl HistoryEntry {
    fn new(command: Box<dyn Command>, result: CommandResult) -> Self {
        Self {
            op_id: result.op_id.clone(),
            command: Arc::new(Mutex::new(command)),
            result,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// =============================================================================
// Command Executor
// =============================================================================

/// Executes commands and manages undo/redo history
pub struct CommandExecutor {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_history_size: usize,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: DEFAULT_MAX_HISTORY,
        }
    }

    /// Sets the maximum history size
    pub fn with_max_history(mut self, size: usize) -> Self {
        self.max_history_size = size.max(1);
        self
    }

    /// Executes a command and adds it to history.
    ///
    /// Discarded and no-op commands are returned to the caller but never
    /// recorded, so they neither clear the redo stack nor mark the store dirty.
    pub fn execute(
        &mut self,
        mut command: Box<dyn Command>,
        store: &mut CueStore,
    ) -> CoreResult<CommandResult> {
        let result = command.execute(store)?;

        debug!(
            command = command.type_name(),
            op_id = %result.op_id,
            outcome = ?result.outcome,
            violations = ?result.violations,
            "Executed command"
        );

        if !result.is_applied() {
            return Ok(result);
        }

        self.redo_stack.clear();
        self.undo_stack
            .push_back(HistoryEntry::new(command, result.clone()));
        while self.undo_stack.len() > self.max_history_size {
            self.undo_stack.pop_front();
        }

        store.is_dirty = true;
        Ok(result)
    }

    /// Undoes the last command
    pub fn undo(&mut self, store: &mut CueStore) -> CoreResult<()> {
        let entry = self.undo_stack.pop_back().ok_or(CoreError::NothingToUndo)?;

        {
            let command = entry
                .command
                .lock()
                .map_err(|_| CoreError::Internal("Failed to lock command for undo".into()))?;
            command.undo(store)?;
            debug!(command = command.type_name(), op_id = %entry.op_id, "Undid command");
        }

        self.redo_stack.push_back(entry);
        store.is_dirty = true;
        Ok(())
    }

    /// Redoes the last undone command
    pub fn redo(&mut self, store: &mut CueStore) -> CoreResult<CommandResult> {
        let entry = self.redo_stack.pop_back().ok_or(CoreError::NothingToRedo)?;

        let result = {
            let mut command = entry
                .command
                .lock()
                .map_err(|_| CoreError::Internal("Failed to lock command for redo".into()))?;
            command.redo(store)?
        };

        self.undo_stack.push_back(HistoryEntry {
            op_id: result.op_id.clone(),
            command: entry.command,
            result: result.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });

        store.is_dirty = true;
        Ok(result)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
