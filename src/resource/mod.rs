//! # Resource
//!
//! Per-resource orchestration: the shared context, the handler that composes
//! bus, serializer, state machine, flow pipeline and health supervision for
//! one resource, and the manager that creates and owns handlers.

pub mod base;
pub mod context;
pub mod manager;
pub mod steps;

pub use base::ResourceBase;
pub use context::OrchestratorContext;
pub use manager::{AddedResource, ResourceManager};
