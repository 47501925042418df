//! # Synchronization
//!
//! Signature-keyed task chains that keep conflicting operations on one
//! resource from running at the same time.

pub mod serializer;

pub use serializer::SyncSerializer;

use uuid::Uuid;

/// Signature for general mutations of a resource record
pub fn resource_signature(resource_id: Uuid) -> String {
    format!("resource-{resource_id}")
}

/// Signature serializing connect attempts of one resource
pub fn connect_signature(resource_id: Uuid) -> String {
    format!("connect-{resource_id}")
}

/// Signature serializing status writes of one resource
pub fn status_signature(resource_id: Uuid) -> String {
    format!("resource-{resource_id}-change-status")
}
