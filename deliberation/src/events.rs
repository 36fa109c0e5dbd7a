//! Event bus — live publication of debate progress to the UI layer.
//!
//! Tokio broadcast-based pub/sub. The runner publishes each completed
//! turn (and phase changes, cooldowns, retries) before moving on, so a
//! renderer can follow the war room in real time while the debate core
//! stays the transcript's only writer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::debate::state::AgentRole;
use crate::debate::transcript::Turn;

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to an [`EventBus`].
pub type SharedEventBus = Arc<EventBus>;

/// Progress events emitted during one engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A macro phase began (welcome, intake, research, debate, synthesis).
    PhaseStarted { phase: String },
    /// A persona's generation call is in flight.
    AgentThinking { agent: AgentRole, round: u32 },
    /// A turn completed and was appended to the transcript.
    TurnCompleted { turn: Turn },
    /// Inter-turn cooldown to respect upstream rate limits.
    Cooldown { seconds: u64 },
    /// A gateway call degraded to its fallback text.
    TurnDegraded { agent: AgentRole, round: u32 },
    /// The debate terminated.
    DebateTerminated { consensus: bool, rounds: u32, turns: usize },
    /// The final report is ready.
    SynthesisReady { report: String },
}

impl EngineEvent {
    /// Short label for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PhaseStarted { .. } => "phase_started",
            Self::AgentThinking { .. } => "agent_thinking",
            Self::TurnCompleted { .. } => "turn_completed",
            Self::Cooldown { .. } => "cooldown",
            Self::TurnDegraded { .. } => "turn_degraded",
            Self::DebateTerminated { .. } => "debate_terminated",
            Self::SynthesisReady { .. } => "synthesis_ready",
        }
    }
}

/// Broadcast event bus. No persistence — a run is ephemeral.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Create a shared reference to this bus.
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers. Having no subscribers is
    /// not an error — headless runs are valid.
    pub fn publish(&self, event: EngineEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(EngineEvent::PhaseStarted {
            phase: "debate".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "phase_started");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::new();
        bus.publish(EngineEvent::Cooldown { seconds: 8 });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_every_event() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(EngineEvent::DebateTerminated {
            consensus: true,
            rounds: 3,
            turns: 9,
        });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                EngineEvent::DebateTerminated { consensus, rounds, turns } => {
                    assert!(consensus);
                    assert_eq!(rounds, 3);
                    assert_eq!(turns, 9);
                }
                other => panic!("unexpected event: {}", other.event_type()),
            }
        }
    }

    #[tokio::test]
    async fn test_turn_completed_carries_turn() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(EngineEvent::TurnCompleted {
            turn: Turn::new(AgentRole::Architect, "opening", 1),
        });

        match rx.recv().await.unwrap() {
            EngineEvent::TurnCompleted { turn } => {
                assert_eq!(turn.agent, AgentRole::Architect);
                assert_eq!(turn.round, 1);
            }
            other => panic!("unexpected event: {}", other.event_type()),
        }
    }

    #[test]
    fn test_event_serde_tagged() {
        let json = serde_json::to_value(EngineEvent::Cooldown { seconds: 8 }).unwrap();
        assert_eq!(json["event"], "cooldown");
        assert_eq!(json["seconds"], 8);
    }
}
