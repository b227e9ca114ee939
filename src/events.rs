//! In-process update bus backed by a `tokio::sync::broadcast` channel.
//!
//! Everything the render surface must observe live flows through here:
//! settings writes, once-per-second timer ticks, and the one-shot completion
//! signal. Designed to be shared via `Arc<UpdateBus>` across the store, the
//! renderer, and the WebSocket fan-out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// An observable change in the countdown application.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UpdateEvent {
    /// A settings field was written.
    FieldChanged { key: String, value: Value },
    /// Periodic remaining-time heartbeat for the render surface.
    TimerTick {
        remaining_ms: u64,
        days: u64,
        hours: u64,
        minutes: u64,
        seconds: u64,
    },
    /// The countdown reached zero.
    Completed { at: DateTime<Utc> },
}

impl UpdateEvent {
    /// Wire name of the event, used as the WebSocket message discriminator.
    pub fn event_name(&self) -> &'static str {
        match self {
            UpdateEvent::FieldChanged { .. } => "field-changed",
            UpdateEvent::TimerTick { .. } => "timer-tick",
            UpdateEvent::Completed { .. } => "completed",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// In-process fan-out bus for [`UpdateEvent`]s.
pub struct UpdateBus {
    sender: broadcast::Sender<UpdateEvent>,
}

impl UpdateBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`; the render surface always
    /// recovers by re-reading a snapshot.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// An event with zero subscribers is silently dropped.
    pub fn publish(&self, event: UpdateEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.sender.subscribe()
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
