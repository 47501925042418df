//! # Models
//!
//! Resource records as persisted by the external store, and the read-only
//! inventory snapshots handed out in replies and events.

pub mod resource;

pub use resource::{NewResource, ResourceInventory, ResourceRecord};
