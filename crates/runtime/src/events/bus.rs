//! Topic-based event bus implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{BattleEvent, QueueChange};

const TARGET: &str = "battle_runtime::events";

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Turn-order changes forwarded from the scheduler
    Queue,
    /// Battle-flow milestones (turns resolved, battle ended)
    Battle,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Queue(QueueChange),
    Battle(BattleEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Queue(_) => Topic::Queue,
            Event::Battle(_) => Topic::Battle,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    queue: broadcast::Sender<Event>,
    battle: broadcast::Sender<Event>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: broadcast::channel(capacity).0,
            battle: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Queue => &self.queue,
            Topic::Battle => &self.battle,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: TARGET, ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
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
    use battle_core::{CombatantId, Side};

    #[tokio::test]
    async fn test_subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut battle = bus.subscribe(Topic::Battle);
        let mut queue = bus.subscribe(Topic::Queue);

        bus.publish(Event::Battle(BattleEvent::Started {
            combatants: 2,
            sides: vec![Side::Party, Side::Troop],
        }));
        bus.publish(Event::Battle(BattleEvent::TurnStarted {
            actor: CombatantId(1),
            round: 1,
        }));

        assert!(matches!(
            battle.recv().await.expect("battle event"),
            Event::Battle(BattleEvent::Started { combatants: 2, .. })
        ));
        assert!(matches!(
            battle.recv().await.expect("battle event"),
            Event::Battle(BattleEvent::TurnStarted { .. })
        ));
        assert!(queue.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(Event::Battle(BattleEvent::TurnStarted {
            actor: CombatantId(3),
            round: 1,
        }));
        assert_eq!(bus.subscribe_multiple(&[Topic::Queue, Topic::Battle]).len(), 2);
    }
}
