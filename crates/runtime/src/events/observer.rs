//! Bridge from scheduler observers to the event bus.

use battle_core::{QueueEvent, QueueObserver, QueueSnapshot};

use super::{Event, EventBus, QueueChange};

/// Republishes every scheduler queue change on [`super::Topic::Queue`].
pub struct BusObserver {
    bus: EventBus,
}

impl BusObserver {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl QueueObserver for BusObserver {
    fn on_queue_changed(&mut self, event: &QueueEvent, snapshot: &QueueSnapshot) {
        self.bus.publish(Event::Queue(QueueChange {
            event: event.clone(),
            snapshot: snapshot.clone(),
        }));
    }
}
