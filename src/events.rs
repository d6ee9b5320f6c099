//! In-process property change notifications.
//!
//! Views that render property data subscribe here and refetch when
//! something changes. Delivery is best effort within this process only.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "property_id", rename_all = "snake_case")]
pub enum PropertyEvent {
    Added(String),
    Updated(String),
    Deleted(String),
    Refresh,
}

#[derive(Debug, Clone)]
pub struct PropertyEvents {
    sender: broadcast::Sender<PropertyEvent>,
}

impl PropertyEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PropertyEvent> {
        self.sender.subscribe()
    }

    /// Publish an event and return how many subscribers received it
    pub fn publish(&self, event: PropertyEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => {
                debug!(delivered, "published property event");
                delivered
            }
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "no subscribers for property event");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PropertyEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
