use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::state_machine::{ResourceState, ResourceStatus};

/// Resource represents one managed backend entity (e.g. a backup store).
/// Persisted by the external store between operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Key into the driver factory registry
    pub resource_type: String,
    pub url: String,
    pub state: ResourceState,
    pub status: ResourceStatus,
    pub total_capacity: u64,
    /// Always `<= total_capacity`
    pub available_capacity: u64,
    /// `None` until the first successful connect
    pub last_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New resource for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    pub name: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub url: String,
    pub total_capacity: u64,
    /// Defaults to `total_capacity`
    pub available_capacity: Option<u64>,
}

impl NewResource {
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>, total_capacity: u64) -> Self {
        Self {
            name: name.into(),
            description: None,
            resource_type: resource_type.into(),
            url: String::new(),
            total_capacity,
            available_capacity: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_available_capacity(mut self, available: u64) -> Self {
        self.available_capacity = Some(available);
        self
    }
}

impl ResourceRecord {
    /// Build a record from creation parameters. Available capacity is clamped to total.
    pub fn from_new(new_resource: NewResource) -> Self {
        let now = Utc::now();
        let available = new_resource
            .available_capacity
            .unwrap_or(new_resource.total_capacity)
            .min(new_resource.total_capacity);
        Self {
            id: Uuid::new_v4(),
            name: new_resource.name,
            description: new_resource.description,
            resource_type: new_resource.resource_type,
            url: new_resource.url,
            state: ResourceState::default(),
            status: ResourceStatus::default(),
            total_capacity: new_resource.total_capacity,
            available_capacity: available,
            last_connected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// A resource that never completed a connect
    pub fn never_connected(&self) -> bool {
        self.last_connected_at.is_none()
    }

    /// Pre-flight size check without mutation
    pub fn check_capacity(&self, required: u64) -> OrchestrationResult<()> {
        if required > self.available_capacity {
            return Err(OrchestrationError::CapacityExceeded {
                resource_id: self.id,
                required,
                available: self.available_capacity,
            });
        }
        Ok(())
    }

    /// Take `size` out of available capacity, or fail without mutation
    pub fn reserve_capacity(&mut self, size: u64) -> OrchestrationResult<()> {
        self.check_capacity(size)?;
        self.available_capacity -= size;
        self.touch();
        Ok(())
    }

    /// Credit `size` back, clamped to total capacity
    pub fn credit_capacity(&mut self, size: u64) {
        self.available_capacity = self
            .available_capacity
            .saturating_add(size)
            .min(self.total_capacity);
        self.touch();
    }

    /// Overwrite both capacities; rejects `available > total`
    pub fn set_capacity(&mut self, total: u64, available: u64) -> OrchestrationResult<()> {
        if available > total {
            return Err(OrchestrationError::Internal(format!(
                "available capacity {available} exceeds total capacity {total}"
            )));
        }
        self.total_capacity = total;
        self.available_capacity = available;
        self.touch();
        Ok(())
    }
}

/// Read-only snapshot handed out in replies and canonical events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInventory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub url: String,
    pub state: ResourceState,
    pub status: ResourceStatus,
    pub total_capacity: u64,
    pub available_capacity: u64,
    pub attached_zones: Vec<Uuid>,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceInventory {
    pub fn from_record(record: &ResourceRecord, attached_zones: Vec<Uuid>) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            resource_type: record.resource_type.clone(),
            url: record.url.clone(),
            state: record.state,
            status: record.status,
            total_capacity: record.total_capacity,
            available_capacity: record.available_capacity,
            attached_zones,
            last_connected_at: record.last_connected_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
