//! # Message Structures
//!
//! Typed, addressable messages routed by the [`MessageBus`](super::MessageBus).
//! A [`Message`] carries a [`Command`] and the UUID of the resource that owns
//! it; the bus wraps it in an [`Envelope`] with a one-shot reply channel so the
//! owning handler can reply exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::cascade::DeletionMode;
use crate::completion::{Completion, CompletionFuture};
use crate::driver::DownloadResult;
use crate::error::OrchestrationResult;
use crate::models::ResourceInventory;
use crate::state_machine::{ResourceStatus, StateEvent};

/// Commands consumed by a resource handler. Each expects exactly one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Run the backend connect hook and move the status accordingly
    Connect { new_add: bool },
    /// API-level reconnect; re-enters the bus as an internal `Connect`
    Reconnect,
    /// Run the backend ping hook
    Ping,
    /// Idempotent status transition
    ChangeStatus { status: ResourceStatus },
    /// Administrative state transition through the transition table
    ChangeState { event: StateEvent },
    AttachToZone { zone_id: Uuid },
    DetachFromZone { zone_id: Uuid },
    /// Cascading deletion through the flow pipeline
    Delete { mode: DeletionMode },
    /// Transactional capacity credit, clamped to total
    ReturnCapacity { size: u64 },
    /// Fetch content into the resource after a capacity reservation
    Download { url: String, size: u64 },
    /// Remove content from the resource and credit its size back
    DeleteBits { install_path: String, size: u64 },
    /// Best-effort backend inventory scan
    Scan,
    /// Rename or re-describe the resource
    Update {
        name: Option<String>,
        description: Option<String>,
    },
    /// Resource-type specific message handled by the driver
    Custom {
        kind: String,
        payload: serde_json::Value,
    },
}

/// Discriminant of [`Command`], used as the key of the permission table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Connect,
    Reconnect,
    Ping,
    ChangeStatus,
    ChangeState,
    AttachToZone,
    DetachFromZone,
    Delete,
    ReturnCapacity,
    Download,
    DeleteBits,
    Scan,
    Update,
    Custom,
}

/// Dispatch class of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// User/API driven lifecycle changes; they publish a canonical event
    Administrative,
    /// Connectivity and workload operations
    Operational,
    /// Routed to the backend driver's own dispatch table
    Extension,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Reconnect => "reconnect",
            Self::Ping => "ping",
            Self::ChangeStatus => "change_status",
            Self::ChangeState => "change_state",
            Self::AttachToZone => "attach_to_zone",
            Self::DetachFromZone => "detach_from_zone",
            Self::Delete => "delete",
            Self::ReturnCapacity => "return_capacity",
            Self::Download => "download",
            Self::DeleteBits => "delete_bits",
            Self::Scan => "scan",
            Self::Update => "update",
            Self::Custom => "custom",
        }
    }

    pub fn class(&self) -> CommandClass {
        match self {
            Self::Reconnect
            | Self::ChangeState
            | Self::AttachToZone
            | Self::DetachFromZone
            | Self::Delete
            | Self::Update => CommandClass::Administrative,
            Self::Connect
            | Self::Ping
            | Self::ChangeStatus
            | Self::ReturnCapacity
            | Self::Download
            | Self::DeleteBits
            | Self::Scan => CommandClass::Operational,
            Self::Custom => CommandClass::Extension,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Connect { .. } => CommandKind::Connect,
            Self::Reconnect => CommandKind::Reconnect,
            Self::Ping => CommandKind::Ping,
            Self::ChangeStatus { .. } => CommandKind::ChangeStatus,
            Self::ChangeState { .. } => CommandKind::ChangeState,
            Self::AttachToZone { .. } => CommandKind::AttachToZone,
            Self::DetachFromZone { .. } => CommandKind::DetachFromZone,
            Self::Delete { .. } => CommandKind::Delete,
            Self::ReturnCapacity { .. } => CommandKind::ReturnCapacity,
            Self::Download { .. } => CommandKind::Download,
            Self::DeleteBits { .. } => CommandKind::DeleteBits,
            Self::Scan => CommandKind::Scan,
            Self::Update { .. } => CommandKind::Update,
            Self::Custom { .. } => CommandKind::Custom,
        }
    }
}

/// A command addressed to one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// Routing key: the resource that owns this message
    pub resource_id: Uuid,
    pub command: Command,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(resource_id: Uuid, command: Command) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id,
            command,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.command.kind()
    }
}

/// Success payload of a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReplyPayload {
    /// Acknowledgement without data
    Ack,
    /// Refreshed resource snapshot
    Inventory(ResourceInventory),
    Download(DownloadResult),
    /// Driver-defined payload for custom messages
    Custom(serde_json::Value),
}

impl ReplyPayload {
    pub fn inventory(&self) -> Option<&ResourceInventory> {
        match self {
            Self::Inventory(inventory) => Some(inventory),
            _ => None,
        }
    }
}

/// Either a success payload or a structured error
pub type Reply = OrchestrationResult<ReplyPayload>;

/// Completion bound to the original sender's reply slot
pub type ReplyResponder = Completion<ReplyPayload>;

/// A message in flight together with the completion its single reply goes to
#[derive(Debug)]
pub struct Envelope {
    pub message: Message,
    pub reply_to: ReplyResponder,
}

impl Envelope {
    /// Build an envelope and the future resolving to its reply
    pub fn new(message: Message) -> (Self, CompletionFuture<ReplyPayload>) {
        let (reply_to, reply) = Completion::channel(format!("{}:{}", message.kind(), message.id));
        (Self { message, reply_to }, reply)
    }

    /// Envelope whose reply nobody waits for (fire-and-forget posts)
    pub fn detached(message: Message) -> Self {
        let (reply_to, _reply) = Completion::channel(format!("{}:{}", message.kind(), message.id));
        Self { message, reply_to }
    }
}
