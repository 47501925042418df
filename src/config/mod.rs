//! # Configuration
//!
//! Environment-aware configuration for the orchestration core. Values come from
//! built-in defaults, an optional TOML file and `ORCHESTRATOR__`-prefixed
//! environment variables, merged by the `config` crate in that order.
//!
//! ```rust,no_run
//! use resource_orchestrator::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().expect("configuration");
//! println!("ping every {:?}", config.health.ping_interval());
//! ```

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for an orchestrator instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub bus: BusConfig,
    pub events: EventConfig,
    pub health: HealthConfig,
    pub serializer: SerializerConfig,
}

/// Message bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Deadline applied by `send` when the caller does not supply one
    pub default_timeout_ms: u64,
    /// Capacity of each resource's inbound mailbox
    pub mailbox_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            mailbox_capacity: 256,
        }
    }
}

impl BusConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Canonical event channel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

/// Health supervisor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub ping_interval_ms: u64,
    /// Upper bound on a single ping round trip through the bus
    pub ping_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ping_interval_ms: 60_000,
            ping_timeout_ms: 30_000,
        }
    }
}

impl HealthConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

/// Per-resource serializer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Number of same-signature tasks allowed to run at once when a task does
    /// not specify its own level
    pub default_sync_level: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            default_sync_level: 1,
        }
    }
}

impl OrchestratorConfig {
    /// Reject values that would stall or disable the engine
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bus.default_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "bus.default_timeout_ms",
                self.bus.default_timeout_ms,
                "must be greater than 0",
            ));
        }
        if self.bus.mailbox_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "bus.mailbox_capacity",
                self.bus.mailbox_capacity,
                "must be greater than 0",
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                self.events.channel_capacity,
                "must be greater than 0",
            ));
        }
        if self.health.ping_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "health.ping_interval_ms",
                self.health.ping_interval_ms,
                "must be greater than 0",
            ));
        }
        if self.health.ping_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "health.ping_timeout_ms",
                self.health.ping_timeout_ms,
                "must be greater than 0",
            ));
        }
        if self.serializer.default_sync_level == 0 {
            return Err(ConfigurationError::invalid_value(
                "serializer.default_sync_level",
                self.serializer.default_sync_level,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
