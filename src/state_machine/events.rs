use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that can trigger administrative state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateEvent {
    Enable,
    Disable,
    /// Enter the pending-delete phase of a deletion pipeline
    PreDelete,
    /// Leave pending-delete after an aborted deletion
    Recover,
    Delete,
}

impl StateEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::PreDelete => "pre_delete",
            Self::Recover => "recover",
            Self::Delete => "delete",
        }
    }

    pub const ALL: [StateEvent; 5] = [
        Self::Enable,
        Self::Disable,
        Self::PreDelete,
        Self::Recover,
        Self::Delete,
    ];
}

impl fmt::Display for StateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type())
    }
}

impl std::str::FromStr for StateEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.event_type() == s)
            .ok_or_else(|| format!("Invalid state event: {s}"))
    }
}
