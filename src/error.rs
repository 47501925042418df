//! Error types for the resource orchestration core.
//!

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Flat discriminant of [`OrchestrationError`], convenient for matching in
/// callers and tests that only care about the category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IllegalOperation,
    IllegalTransition,
    CapacityExceeded,
    BackendFailure,
    Timeout,
    UnhandledMessage,
    VetoedByDependent,
    ExtensionVetoed,
    ResourceNotFound,
    Store,
    Configuration,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IllegalOperation => "illegal_operation",
            Self::IllegalTransition => "illegal_transition",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::BackendFailure => "backend_failure",
            Self::Timeout => "timeout",
            Self::UnhandledMessage => "unhandled_message",
            Self::VetoedByDependent => "vetoed_by_dependent",
            Self::ExtensionVetoed => "extension_vetoed",
            Self::ResourceNotFound => "resource_not_found",
            Self::Store => "store",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        };
        write!(f, "{name}")
    }
}

/// Structured error carried through completions, replies and canonical events.
///
/// Business failures are values of this type, never panics. The type is
/// `Clone + Serialize` because the same error is often both replied to the
/// caller and attached to a published event.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum OrchestrationError {
    /// The state or status gate denied the request
    #[error("resource[uuid:{resource_id}] cannot proceed operation[{operation}]: {reason}")]
    IllegalOperation {
        resource_id: Uuid,
        operation: String,
        reason: String,
    },

    /// The requested transition is not defined from the current state
    #[error("illegal transition from {from} on event {event}")]
    IllegalTransition { from: String, event: String },

    /// Pre-flight size check against available capacity failed
    #[error(
        "resource[uuid:{resource_id}] has not enough capacity. Required size:{required}, available size:{available}"
    )]
    CapacityExceeded {
        resource_id: Uuid,
        required: u64,
        available: u64,
    },

    /// The pluggable backend driver reported a failure
    #[error("backend operation[{operation}] failed: {reason}")]
    BackendFailure { operation: String, reason: String },

    /// No reply arrived within the deadline
    #[error("operation[{operation}] timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// No handler is registered for the message kind
    #[error("unhandled message[{kind}]")]
    UnhandledMessage { kind: String },

    /// A dependent resource refused a cascading deletion check
    #[error("dependent[{dependent}] vetoed the operation: {reason}")]
    VetoedByDependent { dependent: String, reason: String },

    /// A registered extension refused the operation at its pre-check point
    #[error("extension[{extension}] vetoed the operation: {reason}")]
    ExtensionVetoed { extension: String, reason: String },

    #[error("resource[uuid:{resource_id}] not found")]
    ResourceNotFound { resource_id: Uuid },

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestrationError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalOperation { .. } => ErrorKind::IllegalOperation,
            Self::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::BackendFailure { .. } => ErrorKind::BackendFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::UnhandledMessage { .. } => ErrorKind::UnhandledMessage,
            Self::VetoedByDependent { .. } => ErrorKind::VetoedByDependent,
            Self::ExtensionVetoed { .. } => ErrorKind::ExtensionVetoed,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::Store(_) => ErrorKind::Store,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Gate failures are detected before any mutation and never partially apply
    pub fn is_gate_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::IllegalOperation | ErrorKind::IllegalTransition | ErrorKind::CapacityExceeded
        )
    }

    /// Helper for driver implementations
    pub fn backend(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Helper for cascade dependents refusing a deletion check
    pub fn vetoed(dependent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VetoedByDependent {
            dependent: dependent.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<serde_json::Error> for OrchestrationError {
    fn from(error: serde_json::Error) -> Self {
        OrchestrationError::Internal(format!("JSON serialization error: {error}"))
    }
}

impl From<crate::config::ConfigurationError> for OrchestrationError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        OrchestrationError::Configuration(error.to_string())
    }
}

/// Render a caught panic payload as a readable string
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub type OrchestrationResult<T> = std::result::Result<T, OrchestrationError>;
