//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics and consumers subscribe only to the
//! topics they need. Queue changes come straight from the scheduler through
//! [`BusObserver`].

mod bus;
mod observer;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use observer::BusObserver;
pub use types::{BattleEvent, QueueChange};
