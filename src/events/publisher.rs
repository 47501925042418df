use tokio::sync::broadcast;
use tracing::debug;

use super::types::CanonicalEvent;

/// Broadcast publisher for canonical resource events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub event: CanonicalEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to every current subscriber
    pub fn publish(&self, event: CanonicalEvent) {
        let published = PublishedEvent {
            name: event.name().to_string(),
            event,
            published_at: chrono::Utc::now(),
        };

        // For broadcast channels, send() returns an error if there are no subscribers.
        // Publishing with nobody listening is acceptable.
        if let Err(broadcast::error::SendError(unsent)) = self.sender.send(published) {
            debug!(event = %unsent.name, "No subscribers for published event");
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000) // Default capacity of 1000 events
    }
}
