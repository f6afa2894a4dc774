//! # Player Event Bus
//!
//! Broadcast channel carrying controller notifications to host subscribers,
//! built on `tokio::sync::broadcast`.
//!
//! Subscribers receive every event emitted after they subscribe; a slow
//! subscriber gets `RecvError::Lagged` and can keep consuming afterwards.
//! Emitting with no subscribers is not an error.

use crate::state::{Operation, PlayerState};
use bridge_traits::FocusChange;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 32;

/// Notifications published by a playback controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    /// The lifecycle state changed. `operation` names the triggering
    /// operation, or is `None` for engine- and focus-driven transitions.
    StateChanged {
        from: PlayerState,
        to: PlayerState,
        operation: Option<Operation>,
    },
    /// An operation was invoked from a state where it is not legal.
    OperationRejected {
        operation: Operation,
        state: PlayerState,
    },
    /// A host focus transition was applied.
    FocusChanged { change: FocusChange },
    /// The master volume was attenuated for transient focus loss.
    Ducked { volume: f32 },
    /// A requested seek finished.
    SeekCompleted,
    /// The engine reported a fault; the controller is now in `Error`.
    EngineFault { code: i32, extra: i32 },
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            PlayerEvent::StateChanged { .. } => "Lifecycle state changed",
            PlayerEvent::OperationRejected { .. } => "Operation rejected by lifecycle gate",
            PlayerEvent::FocusChanged { .. } => "Audio focus changed",
            PlayerEvent::Ducked { .. } => "Volume ducked",
            PlayerEvent::SeekCompleted => "Seek completed",
            PlayerEvent::EngineFault { .. } => "Engine fault",
        }
    }

    /// Returns `true` for events that indicate a problem.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            PlayerEvent::OperationRejected { .. } | PlayerEvent::EngineFault { .. }
        )
    }
}

/// Central broadcast channel for player events.
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// The send error (no subscribers) is intentionally swallowed; events
    /// are advisory and the controller never depends on their delivery.
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(PlayerEvent::SeekCompleted);
        assert_eq!(rx.recv().await.unwrap(), PlayerEvent::SeekCompleted);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_get_a_copy() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(PlayerEvent::Ducked { volume: 0.1 });
        assert_eq!(a.recv().await.unwrap(), PlayerEvent::Ducked { volume: 0.1 });
        assert_eq!(b.recv().await.unwrap(), PlayerEvent::Ducked { volume: 0.1 });
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.emit(PlayerEvent::SeekCompleted);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn events_serialize_with_type_tags() {
        let event = PlayerEvent::StateChanged {
            from: PlayerState::Idle,
            to: PlayerState::Initialized,
            operation: Some(Operation::SetSource),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"StateChanged\""));

        let back: PlayerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn warning_classification() {
        assert!(PlayerEvent::EngineFault { code: 1, extra: 0 }.is_warning());
        assert!(!PlayerEvent::SeekCompleted.is_warning());
    }

    #[test]
    fn descriptions_are_stable() {
        assert_eq!(
            PlayerEvent::EngineFault { code: 1, extra: 0 }.description(),
            "Engine fault"
        );
        assert_eq!(
            PlayerEvent::OperationRejected {
                operation: Operation::Start,
                state: PlayerState::Idle,
            }
            .description(),
            "Operation rejected by lifecycle gate"
        );
        assert_eq!(PlayerEvent::SeekCompleted.description(), "Seek completed");
    }
}
