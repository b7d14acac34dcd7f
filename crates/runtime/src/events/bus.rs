//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;

use game_core::{SkillEvent, Tick};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Cast lifecycle (started, completed, cancelled, failed)
    Cast,
    /// Damage, healing, statuses, knockback and deaths
    Combat,
    /// Ground footprints and their cells
    Unit,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Cast, Topic::Combat, Topic::Unit];

    pub fn of(event: &SkillEvent) -> Topic {
        if event.is_cast() {
            Topic::Cast
        } else if event.is_unit() {
            Topic::Unit
        } else {
            Topic::Combat
        }
    }
}

/// A world event stamped with the world clock it was drained at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub tick: Tick,
    pub payload: SkillEvent,
}

impl Event {
    pub fn new(tick: Tick, payload: SkillEvent) -> Self {
        Self { tick, payload }
    }

    pub fn topic(&self) -> Topic {
        Topic::of(&self.payload)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    cast: broadcast::Sender<Event>,
    combat: broadcast::Sender<Event>,
    unit: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cast: broadcast::channel(capacity).0,
            combat: broadcast::channel(capacity).0,
            unit: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Cast => &self.cast,
            Topic::Combat => &self.combat,
            Topic::Unit => &self.unit,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
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
    use game_core::{EntityId, StatusKind};

    fn status_ended() -> SkillEvent {
        SkillEvent::StatusEnded {
            target: EntityId(1),
            kind: StatusKind::Stunned,
        }
    }

    #[tokio::test]
    async fn events_only_reach_their_topic() {
        let bus = EventBus::new();
        let mut combat = bus.subscribe(Topic::Combat);
        let mut cast = bus.subscribe(Topic::Cast);

        bus.publish(Event::new(Tick(40), status_ended()));

        let received = combat.recv().await.unwrap();
        assert_eq!(received.tick, Tick(40));
        assert!(cast.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::with_capacity(0);
        bus.publish(Event::new(Tick::ZERO, status_ended()));
    }

    #[test]
    fn events_serialize_to_json() {
        let event = Event::new(Tick(7), status_ended());
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
