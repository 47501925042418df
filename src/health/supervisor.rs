//! # Health Supervisor
//!
//! Periodic liveness checks of tracked resources. Every tracked resource gets
//! its own ping task, so a slow or hung ping never delays the others.
//!
//! Pings go through the bus as ordinary `Ping` commands; the resource
//! handler reacts to the outcome (reconnect on success when not connected,
//! `Disconnected` on failure). A ping that gets no reply within the ping
//! timeout is treated as a failure and posts `ChangeStatus(Disconnected)`.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HealthConfig;
use crate::error::ErrorKind;
use crate::messaging::{Command, MessageBus};
use crate::state_machine::ResourceStatus;

/// Tracks resources and pings them on a fixed interval
#[derive(Debug, Clone)]
pub struct HealthSupervisor {
    bus: MessageBus,
    tracked: Arc<DashMap<Uuid, JoinHandle<()>>>,
    enabled: bool,
    interval: Duration,
    ping_timeout: Duration,
}

impl HealthSupervisor {
    pub fn new(config: &HealthConfig, bus: MessageBus) -> Self {
        Self {
            bus,
            tracked: Arc::new(DashMap::new()),
            enabled: config.enabled,
            interval: config.ping_interval(),
            ping_timeout: config.ping_timeout(),
        }
    }

    /// Begin periodic pings of `resource_id`. Tracking twice is a no-op.
    pub fn track(&self, resource_id: Uuid) {
        if !self.enabled {
            debug!(resource_id = %resource_id, "Health supervision disabled, not tracking");
            return;
        }
        if self.tracked.contains_key(&resource_id) {
            return;
        }

        let handle = tokio::spawn(Self::ping_loop(
            self.bus.clone(),
            self.tracked.clone(),
            resource_id,
            self.interval,
            self.ping_timeout,
        ));
        // A concurrent track may have won the race; keep one loop only
        if let Some(previous) = self.tracked.insert(resource_id, handle) {
            previous.abort();
        }
        info!(resource_id = %resource_id, interval_ms = self.interval.as_millis() as u64, "💓 HEALTH: Tracking resource");
    }

    /// Stop pinging `resource_id`
    pub fn untrack(&self, resource_id: Uuid) -> bool {
        match self.tracked.remove(&resource_id) {
            Some((_, handle)) => {
                handle.abort();
                info!(resource_id = %resource_id, "💤 HEALTH: Untracked resource");
                true
            }
            None => false,
        }
    }

    pub fn is_tracked(&self, resource_id: Uuid) -> bool {
        self.tracked.contains_key(&resource_id)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Stop every ping loop
    pub fn shutdown(&self) {
        let ids: Vec<Uuid> = self.tracked.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.untrack(id);
        }
    }

    async fn ping_loop(
        bus: MessageBus,
        tracked: Arc<DashMap<Uuid, JoinHandle<()>>>,
        resource_id: Uuid,
        interval: Duration,
        ping_timeout: Duration,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; ping one interval after tracking
        ticker.tick().await;

        loop {
            ticker.tick().await;
            debug!(resource_id = %resource_id, "Pinging resource");

            match bus
                .send_with_timeout(resource_id, Command::Ping, ping_timeout)
                .await
            {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::ResourceNotFound => {
                    warn!(resource_id = %resource_id, "Tracked resource no longer routable, stopping pings");
                    tracked.remove(&resource_id);
                    return;
                }
                Err(e) if e.kind() == ErrorKind::Timeout => {
                    warn!(resource_id = %resource_id, error = %e, "⏰ HEALTH: Ping hung, marking disconnected");
                    bus.post(
                        resource_id,
                        Command::ChangeStatus {
                            status: ResourceStatus::Disconnected,
                        },
                    )
                    .await;
                }
                Err(e) => {
                    debug!(resource_id = %resource_id, error = %e, "Ping reported failure");
                }
            }
        }
    }
}
