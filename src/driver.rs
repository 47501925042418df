//! # Backend Driver
//!
//! Resource-type specific operations behind an abstract contract. The
//! orchestration core never talks to a backend directly: it gates, serializes
//! and records, and calls these hooks for the actual work.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::OrchestrationResult;
use crate::models::ResourceInventory;
use crate::state_machine::StateTransition;

/// Outcome of a backend download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub install_path: String,
    /// Bytes actually consumed on the backend
    pub size: u64,
}

/// Backend capacity as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub total: u64,
    pub available: u64,
}

/// Hooks a concrete resource type implements
#[async_trait]
pub trait ResourceDriver: Send + Sync + fmt::Debug {
    /// Establish connectivity. `new_add` is true for the first attempt after creation.
    /// A returned capacity report is written to the record in a transaction.
    async fn connect(
        &self,
        resource: &ResourceInventory,
        new_add: bool,
    ) -> OrchestrationResult<Option<CapacityReport>>;

    async fn ping(&self, resource: &ResourceInventory) -> OrchestrationResult<()>;

    async fn attach(&self, _resource: &ResourceInventory, _zone_id: Uuid) -> OrchestrationResult<()> {
        Ok(())
    }

    async fn detach(&self, _resource: &ResourceInventory, _zone_id: Uuid) -> OrchestrationResult<()> {
        Ok(())
    }

    async fn change_state(
        &self,
        _resource: &ResourceInventory,
        _transition: &StateTransition,
    ) -> OrchestrationResult<()> {
        Ok(())
    }

    /// Release backend resources before the record is removed
    async fn delete(&self, _resource: &ResourceInventory) -> OrchestrationResult<()> {
        Ok(())
    }

    async fn scan(&self, _resource: &ResourceInventory) -> OrchestrationResult<()> {
        Ok(())
    }

    async fn download(
        &self,
        resource: &ResourceInventory,
        url: &str,
        size: u64,
    ) -> OrchestrationResult<DownloadResult>;

    async fn delete_bits(&self, resource: &ResourceInventory, install_path: &str) -> OrchestrationResult<()>;

    /// Resource-type specific messages. `None` means the kind is unknown.
    async fn handle_custom(
        &self,
        _resource: &ResourceInventory,
        _kind: &str,
        _payload: &serde_json::Value,
    ) -> Option<OrchestrationResult<serde_json::Value>> {
        None
    }
}

/// Builds a driver for one resource of a given type
pub trait DriverFactory: Send + Sync {
    fn resource_type(&self) -> &str;

    fn create(&self, resource: &ResourceInventory) -> OrchestrationResult<Arc<dyn ResourceDriver>>;
}
