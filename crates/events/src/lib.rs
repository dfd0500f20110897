//! In-process event bus.
//!
//! Mutations publish [`Event::PageInvalidated`] for every cached view they
//! make stale; whatever renders those views subscribes and drops its copy.

use serde::Serialize;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Events published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The cached page at `path` is stale.
    PageInvalidated { path: String },
}

impl Event {
    pub fn page_invalidated(path: impl Into<String>) -> Self {
        Self::PageInvalidated { path: path.into() }
    }
}

/// Broadcast bus; cloning yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers that will see it.
    pub fn publish(&self, event: Event) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(target: "bookshelf-events", ?event, "no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
