//! Canonical events broadcast after a committed change to a resource.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrchestrationError;
use crate::models::ResourceInventory;
use crate::state_machine::{ResourceState, ResourceStatus, StateEvent};

/// Event name constants
pub mod names {
    pub const STATUS_CHANGED: &str = "resource.status_changed";
    pub const STATE_CHANGED: &str = "resource.state_changed";
    pub const ZONE_ATTACHED: &str = "resource.zone_attached";
    pub const ZONE_DETACHED: &str = "resource.zone_detached";
    pub const RESOURCE_DELETED: &str = "resource.deleted";
    pub const RECONNECTED: &str = "resource.reconnected";
    pub const RESOURCE_UPDATED: &str = "resource.updated";
}

/// Notification of a committed state change. Administrative outcomes carry
/// either the refreshed inventory or the structured error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CanonicalEvent {
    StatusChanged {
        resource_id: Uuid,
        old_status: ResourceStatus,
        new_status: ResourceStatus,
        snapshot: ResourceInventory,
    },
    StateChanged {
        resource_id: Uuid,
        event: StateEvent,
        old_state: Option<ResourceState>,
        new_state: Option<ResourceState>,
        inventory: Option<ResourceInventory>,
        error: Option<OrchestrationError>,
    },
    ZoneAttached {
        resource_id: Uuid,
        zone_id: Uuid,
        inventory: Option<ResourceInventory>,
        error: Option<OrchestrationError>,
    },
    ZoneDetached {
        resource_id: Uuid,
        zone_id: Uuid,
        inventory: Option<ResourceInventory>,
        error: Option<OrchestrationError>,
    },
    ResourceDeleted {
        resource_id: Uuid,
        inventory: Option<ResourceInventory>,
        error: Option<OrchestrationError>,
    },
    Reconnected {
        resource_id: Uuid,
        inventory: Option<ResourceInventory>,
        error: Option<OrchestrationError>,
    },
    ResourceUpdated {
        resource_id: Uuid,
        inventory: ResourceInventory,
    },
}

impl CanonicalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => names::STATUS_CHANGED,
            Self::StateChanged { .. } => names::STATE_CHANGED,
            Self::ZoneAttached { .. } => names::ZONE_ATTACHED,
            Self::ZoneDetached { .. } => names::ZONE_DETACHED,
            Self::ResourceDeleted { .. } => names::RESOURCE_DELETED,
            Self::Reconnected { .. } => names::RECONNECTED,
            Self::ResourceUpdated { .. } => names::RESOURCE_UPDATED,
        }
    }

    pub fn resource_id(&self) -> Uuid {
        match self {
            Self::StatusChanged { resource_id, .. }
            | Self::StateChanged { resource_id, .. }
            | Self::ZoneAttached { resource_id, .. }
            | Self::ZoneDetached { resource_id, .. }
            | Self::ResourceDeleted { resource_id, .. }
            | Self::Reconnected { resource_id, .. }
            | Self::ResourceUpdated { resource_id, .. } => *resource_id,
        }
    }

    pub fn error(&self) -> Option<&OrchestrationError> {
        match self {
            Self::StateChanged { error, .. }
            | Self::ZoneAttached { error, .. }
            | Self::ZoneDetached { error, .. }
            | Self::ResourceDeleted { error, .. }
            | Self::Reconnected { error, .. } => error.as_ref(),
            Self::StatusChanged { .. } | Self::ResourceUpdated { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }
}
