//! In-process fan-out of live events to connected gateway sessions

use serde::Serialize;
use tokio::sync::broadcast;

use crate::constants::LIVE_CHANNEL_CAPACITY;
use crate::models::Notification;

/// Event delivered to the websocket sessions of one user
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum LiveEvent {
    Notification(Notification),
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub user_id: u64,
    pub event: LiveEvent,
}

/// Broadcast hub; every gateway session subscribes and keeps the events
/// addressed to its own user
#[derive(Debug, Clone)]
pub struct LiveHub {
    tx: broadcast::Sender<Envelope>,
}

impl LiveHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Push an event; returns the number of sessions it reached the channel of
    pub fn push(&self, user_id: u64, event: LiveEvent) -> usize {
        // No subscribers is not an error: the event stays persisted elsewhere
        self.tx.send(Envelope { user_id, event }).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}
