//! # Message Bus
//!
//! In-process routing of addressed commands to the handler owning a resource
//! UUID, plus broadcast of canonical events.
//!
//! The directory maps each resource UUID to the inbound mailbox of its
//! handler. It is maintained by the resource layer: entries are added when a
//! resource is registered and removed when it is deleted.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use super::message::{Command, Envelope, Message, Reply};
use crate::config::BusConfig;
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::events::{CanonicalEvent, EventPublisher, PublishedEvent};

/// Mailbox sender owned by the bus directory
pub type Mailbox = mpsc::Sender<Envelope>;

/// Request/reply and publish/subscribe substrate shared by every resource
#[derive(Debug, Clone)]
pub struct MessageBus {
    directory: Arc<DashMap<Uuid, Mailbox>>,
    events: EventPublisher,
    default_timeout: Duration,
    mailbox_capacity: usize,
}

impl MessageBus {
    pub fn new(config: &BusConfig, events: EventPublisher) -> Self {
        Self {
            directory: Arc::new(DashMap::new()),
            events,
            default_timeout: config.default_timeout(),
            mailbox_capacity: config.mailbox_capacity,
        }
    }

    /// Register a handler for `resource_id` and return the receiving end of its mailbox.
    /// Re-registering replaces the previous mailbox.
    pub fn register(&self, resource_id: Uuid) -> mpsc::Receiver<Envelope> {
        let (sender, receiver) = mpsc::channel(self.mailbox_capacity);
        if self.directory.insert(resource_id, sender).is_some() {
            warn!(resource_id = %resource_id, "Replacing existing mailbox registration");
        }
        debug!(resource_id = %resource_id, "📬 BUS: Registered resource mailbox");
        receiver
    }

    pub fn unregister(&self, resource_id: Uuid) -> bool {
        let removed = self.directory.remove(&resource_id).is_some();
        if removed {
            debug!(resource_id = %resource_id, "📭 BUS: Unregistered resource mailbox");
        }
        removed
    }

    pub fn is_registered(&self, resource_id: Uuid) -> bool {
        self.directory.contains_key(&resource_id)
    }

    pub fn registered_count(&self) -> usize {
        self.directory.len()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Send a command and wait for its reply within the default timeout
    pub async fn send(&self, resource_id: Uuid, command: Command) -> Reply {
        self.send_with_timeout(resource_id, command, self.default_timeout)
            .await
    }

    /// Send a command and wait for its reply, failing with `Timeout` after
    /// `timeout`. The deadline covers queueing on a full mailbox as well.
    pub async fn send_with_timeout(
        &self,
        resource_id: Uuid,
        command: Command,
        timeout: Duration,
    ) -> Reply {
        let message = Message::new(resource_id, command);
        let operation = message.kind().to_string();
        let (envelope, reply) = Envelope::new(message);
        let exchange = async {
            self.route(envelope).await?;
            reply.await
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!(
                    resource_id = %resource_id,
                    operation = %operation,
                    timeout_ms = timeout.as_millis() as u64,
                    "⏰ BUS: No reply within deadline"
                );
                Err(OrchestrationError::Timeout {
                    operation,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Send a command and return immediately; `callback` runs with the reply
    /// (or the timeout error) once it arrives.
    pub fn send_async<F, Fut>(&self, resource_id: Uuid, command: Command, callback: F)
    where
        F: FnOnce(Reply) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let bus = self.clone();
        tokio::spawn(async move {
            let reply = bus.send(resource_id, command).await;
            callback(reply).await;
        });
    }

    /// Fire-and-forget delivery; routing errors are logged, not returned
    pub async fn post(&self, resource_id: Uuid, command: Command) {
        let message = Message::new(resource_id, command);
        let kind = message.kind();
        if let Err(e) = self.route(Envelope::detached(message)).await {
            warn!(
                resource_id = %resource_id,
                command = %kind,
                error = %e,
                "Failed to post message"
            );
        }
    }

    async fn route(&self, envelope: Envelope) -> OrchestrationResult<()> {
        let resource_id = envelope.message.resource_id;
        // Clone the sender so no directory shard lock is held across the await
        let mailbox = self
            .directory
            .get(&resource_id)
            .map(|entry| entry.value().clone())
            .ok_or(OrchestrationError::ResourceNotFound { resource_id })?;

        mailbox.send(envelope).await.map_err(|rejected| {
            let envelope = rejected.0;
            let error = OrchestrationError::ResourceNotFound { resource_id };
            envelope.reply_to.fail(error.clone());
            error
        })
    }

    /// Broadcast a canonical event to every current subscriber
    pub fn publish(&self, event: CanonicalEvent) {
        self.events.publish(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }
}
