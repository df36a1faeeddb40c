//! Cloneable façade for controlling a running session.
//!
//! [`SessionHandle`] hides channel plumbing: it can cancel the battle from any
//! task and stream events from specific topics.
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::events::{Event, EventBus, Topic};

/// Client-facing handle to a [`crate::BattleSession`].
#[derive(Clone)]
pub struct SessionHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
    event_bus: EventBus,
}

impl SessionHandle {
    pub(crate) fn new(cancel_tx: watch::Sender<bool>, event_bus: EventBus) -> Self {
        Self {
            cancel_tx: Arc::new(cancel_tx),
            event_bus,
        }
    }

    /// Cancel the battle. A pending decision is dropped and the session ends
    /// with [`battle_core::EndReason::Aborted`].
    pub fn abort(&self) {
        // send_replace never fails, even after the session has finished.
        self.cancel_tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Subscribe to a specific event topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
