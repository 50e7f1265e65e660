//! Session handle that reports every outcome on the event bus.

use std::path::PathBuf;

use tokio::sync::broadcast;

use cuesync_lib::core::commands::{Command, CommandOutcome, CommandResult};
use cuesync_lib::core::CoreResult;
use cuesync_lib::EditingSession;

use crate::events::{CueEvent, CueEventBus};

/// An [`EditingSession`] whose mutations are announced to subscribers
pub struct SessionHandle {
    session: EditingSession,
    bus: CueEventBus,
}

impl SessionHandle {
    pub fn new(session: EditingSession) -> Self {
        Self::with_bus(session, CueEventBus::default())
    }

    pub fn with_bus(session: EditingSession, bus: CueEventBus) -> Self {
        Self { session, bus }
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn into_session(self) -> EditingSession {
        self.session
    }

    pub fn bus(&self) -> &CueEventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CueEvent> {
        self.bus.subscribe()
    }

    /// Executes a command and publishes what became of it
    pub fn execute(&mut self, command: Box<dyn Command>) -> CoreResult<CommandResult> {
        let name = command.type_name().to_string();
        match self.session.execute(command) {
            Ok(result) => {
                self.bus.publish(Self::outcome_event(name, &result));
                Ok(result)
            }
            Err(err) => {
                if err.is_validation_error() {
                    self.bus.publish(CueEvent::Rejected {
                        command: name,
                        tag: err.tag(),
                        reason: err.to_string(),
                    });
                }
                Err(err)
            }
        }
    }

    pub fn undo(&mut self) -> CoreResult<()> {
        self.session.undo()?;
        self.publish_history();
        Ok(())
    }

    pub fn redo(&mut self) -> CoreResult<CommandResult> {
        let result = self.session.redo()?;
        self.publish_history();
        Ok(result)
    }

    pub fn save(&mut self) -> CoreResult<()> {
        self.session.save()?;
        self.bus.publish(CueEvent::Saved {
            path: self.session.path.display().to_string(),
        });
        Ok(())
    }

    pub fn save_as(&mut self, path: PathBuf) -> CoreResult<()> {
        self.session.path = path;
        self.save()
    }

    fn outcome_event(command: String, result: &CommandResult) -> CueEvent {
        match result.outcome {
            CommandOutcome::Applied => CueEvent::Changed {
                op_id: result.op_id.clone(),
                command,
                changes: result.changes.clone(),
                violations: result.violations.clone(),
            },
            CommandOutcome::Unchanged => CueEvent::Unchanged {
                command,
                violations: result.violations.clone(),
            },
            CommandOutcome::Discarded => CueEvent::Discarded { command },
        }
    }

    fn publish_history(&self) {
        self.bus.publish(CueEvent::HistoryMoved {
            can_undo: self.session.executor.can_undo(),
            can_redo: self.session.executor.can_redo(),
        });
    }
}
