use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative lifecycle state of a resource (user/API controlled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Resource accepts every operation its status permits
    #[default]
    Enabled,
    /// Resource is kept but refuses new workload
    Disabled,
    /// A deletion pipeline is in flight
    PendingDelete,
    /// Terminal; the record is about to be removed from the store
    Deleted,
}

impl ResourceState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    pub const ALL: [ResourceState; 4] = [
        Self::Enabled,
        Self::Disabled,
        Self::PendingDelete,
        Self::Deleted,
    ];
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::PendingDelete => write!(f, "pending_delete"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for ResourceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "pending_delete" => Ok(Self::PendingDelete),
            "deleted" => Ok(Self::Deleted),
            _ => Err(format!("Invalid resource state: {s}")),
        }
    }
}

/// Operational connectivity status of a resource (derived from pings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Connecting,
    Connected,
    /// Initial status of a newly added resource as well as the failure status
    #[default]
    Disconnected,
}

impl ResourceStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub const ALL: [ResourceStatus; 3] = [Self::Connecting, Self::Connected, Self::Disconnected];
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connecting" => Ok(Self::Connecting),
            "connected" => Ok(Self::Connected),
            "disconnected" => Ok(Self::Disconnected),
            _ => Err(format!("Invalid resource status: {s}")),
        }
    }
}
