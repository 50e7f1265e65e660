//! Store change events.
//!
//! A broadcast channel fans every committed change, rejection and history
//! move out to any number of subscribers. Publishing never blocks; a slow
//! subscriber lags and skips events instead of stalling the editor.

use serde::Serialize;
use tokio::sync::broadcast;

use cuesync_lib::core::commands::StateChange;
use cuesync_lib::core::validation::ErrorTag;
use cuesync_lib::core::OpId;

/// Events buffered per subscriber before it starts lagging
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something observable happened to the store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CueEvent {
    /// A command changed the store
    #[serde(rename_all = "camelCase")]
    Changed {
        op_id: OpId,
        command: String,
        changes: Vec<StateChange>,
        /// Rules that corrected the input on the way in
        violations: Vec<ErrorTag>,
    },
    /// The edit produced no observable change
    #[serde(rename_all = "camelCase")]
    Unchanged {
        command: String,
        violations: Vec<ErrorTag>,
    },
    /// A deferred edit arrived with a stale token and was dropped
    #[serde(rename_all = "camelCase")]
    Discarded { command: String },
    /// The validation-error signal: a command was refused
    #[serde(rename_all = "camelCase")]
    Rejected {
        command: String,
        tag: Option<ErrorTag>,
        reason: String,
    },
    /// Undo or redo moved through the history
    #[serde(rename_all = "camelCase")]
    HistoryMoved { can_undo: bool, can_redo: bool },
    #[serde(rename_all = "camelCase")]
    Saved { path: String },
}

/// Multi-subscriber event fan-out
#[derive(Debug, Clone)]
pub struct CueEventBus {
    sender: broadcast::Sender<CueEvent>,
}

impl CueEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CueEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends to every live subscriber; having none is not an error
    pub fn publish(&self, event: CueEvent) {
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!(receivers, "Published cue event"),
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "No subscribers for cue event")
            }
        }
    }
}

impl Default for CueEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = CueEventBus::default();
        bus.publish(CueEvent::Saved {
            path: "a.srt".into(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_event() {
        let bus = CueEventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = CueEvent::HistoryMoved {
            can_undo: true,
            can_redo: false,
        };
        bus.publish(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_slow_subscriber_lags() {
        let bus = CueEventBus::new(2);
        let mut receiver = bus.subscribe();
        for i in 0..4 {
            bus.publish(CueEvent::Saved {
                path: format!("{i}.srt"),
            });
        }
        assert!(matches!(
            receiver.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(2))
        ));
    }

    #[test]
    fn test_event_serialization() {
        let event = CueEvent::Rejected {
            command: "SplitCue".into(),
            tag: Some(ErrorTag::SplitError),
            reason: "too short".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["tag"], "SPLIT_ERROR");
    }
}
